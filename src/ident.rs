use crate::document::SvgDocument;

pub const ID_PREFIX: &str = "text";

/// Returns the first `text<N>` (N counting up from 1) that no element in
/// `document` already uses as its id.
pub fn allocate(document: &SvgDocument) -> String {
    let mut counter = 1usize;
    loop {
        let candidate = format!("{}{}", ID_PREFIX, counter);
        if !document.contains_id(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::events::BytesStart;

    fn doc(body: &str) -> SvgDocument {
        SvgDocument::parse(&format!("<svg>{}</svg>", body)).expect("parse")
    }

    #[test]
    fn starts_at_one() {
        assert_eq!(allocate(&doc("")), "text1");
    }

    #[test]
    fn skips_existing_ids() {
        let document = doc(r#"<text id="text1"/><g id="text2"><path id="text3"/></g>"#);
        assert_eq!(allocate(&document), "text4");
    }

    #[test]
    fn fills_the_first_gap() {
        let document = doc(r#"<text id="text2"/><text id="text3"/>"#);
        assert_eq!(allocate(&document), "text1");
    }

    #[test]
    fn ignores_ids_that_only_share_the_prefix() {
        let document = doc(r#"<text id="text"/><text id="text01"/><text id="textA"/>"#);
        assert_eq!(allocate(&document), "text1");
    }

    #[test]
    fn repeated_allocation_never_collides() {
        let mut document = doc(r#"<text id="text1"/><text id="text3"/>"#);
        let mut seen = Vec::new();
        for _ in 0..5 {
            let id = allocate(&document);
            assert!(!seen.contains(&id), "{} allocated twice", id);
            let mut start = BytesStart::new("text");
            start.push_attribute(("id", id.as_str()));
            document.append_to_canvas(start, "x").expect("append");
            seen.push(id);
        }
        assert_eq!(seen, ["text2", "text4", "text5", "text6", "text7"]);
    }
}
