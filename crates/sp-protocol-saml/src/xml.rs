//! Lightweight XML support.
//!
//! Inbound protocol messages are read into a small element tree keyed by
//! local names, which keeps the model parsers independent of namespace
//! prefixes. Outbound XML is built with string templates elsewhere; the
//! helpers here cover escaping, declaration stripping and the raw-slice
//! extraction the signature code needs (signatures must see the original
//! bytes, not a re-serialization).

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{SamlError, SamlResult};

/// A parsed XML element: local name, attributes, children and text.
#[derive(Debug, Clone, Default)]
pub struct XmlElement {
    /// The element's local name (namespace prefix stripped).
    pub name: String,
    /// Attributes by local name, in document order.
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
    /// Concatenated character data directly inside this element.
    pub text: String,
}

impl XmlElement {
    /// Parses a document and returns its root element.
    pub fn parse(xml: &str) -> SamlResult<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    stack.push(element_from_start(&e));
                }
                Ok(Event::Empty(e)) => {
                    let element = element_from_start(&e);
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack.pop().ok_or_else(|| {
                        SamlError::XmlParse("unbalanced closing tag".to_string())
                    })?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(t)) => {
                    if let Some(current) = stack.last_mut() {
                        let text = t
                            .unescape()
                            .map_err(|e| SamlError::XmlParse(e.to_string()))?;
                        current.text.push_str(&text);
                    }
                }
                Ok(Event::CData(t)) => {
                    if let Some(current) = stack.last_mut() {
                        let text = std::str::from_utf8(&t)
                            .map_err(|e| SamlError::XmlParse(e.to_string()))?;
                        current.text.push_str(text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(SamlError::XmlParse(e.to_string())),
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(SamlError::XmlParse("unclosed element".to_string()));
        }
        root.ok_or_else(|| SamlError::XmlParse("document has no root element".to_string()))
    }

    /// Returns an attribute value by local name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the first child with the given local name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Returns all children with the given local name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Returns the element's character data with surrounding whitespace removed.
    #[must_use]
    pub fn text_trimmed(&self) -> &str {
        self.text.trim()
    }
}

fn element_from_start(e: &quick_xml::events::BytesStart<'_>) -> XmlElement {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_default();
        attributes.push((key, value));
    }

    XmlElement {
        name,
        attributes,
        children: Vec::new(),
        text: String::new(),
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> SamlResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(SamlError::XmlParse(
            "document has more than one root element".to_string(),
        ));
    }
    *root = Some(element);
    Ok(())
}

/// Escapes character data for embedding in an XML template.
#[must_use]
pub fn escape_xml(value: &str) -> String {
    quick_xml::escape::escape(value).into_owned()
}

/// Removes a leading `<?xml ...?>` declaration if present.
#[must_use]
pub fn strip_xml_declaration(xml: &str) -> &str {
    let trimmed = xml.trim_start();
    if let Some(rest) = trimmed.strip_prefix("<?xml") {
        if let Some(end) = rest.find("?>") {
            return rest[end + 2..].trim_start();
        }
    }
    trimmed
}

/// Extracts the raw source slice of the element carrying the given ID.
///
/// Signature digests are computed over the original serialization, so the
/// element must be cut out of the source text rather than re-serialized.
#[must_use]
pub fn extract_element_by_id(xml: &str, id: &str) -> Option<String> {
    let id_pattern = format!("ID=\"{id}\"");
    let alt_pattern = format!("Id=\"{id}\"");

    let pos = xml.find(&id_pattern).or_else(|| xml.find(&alt_pattern))?;

    // Walk back to the '<' opening this element.
    let start = xml[..pos].rfind('<')?;

    // Local tag name, with any namespace prefix.
    let name_end = xml[start + 1..]
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .map(|offset| start + 1 + offset)?;
    let tag_name = &xml[start + 1..name_end];

    // Self-closing elements end at their own tag.
    let open_end = xml[start..].find('>')? + start;
    if xml[..open_end].ends_with('/') {
        return Some(xml[start..open_end + 1].to_string());
    }

    let close_tag = format!("</{tag_name}");
    let close_pos = xml[start..].find(&close_tag)? + start;
    let end = xml[close_pos..].find('>')? + close_pos + 1;

    Some(xml[start..end].to_string())
}

/// Removes the first `Signature` element (enveloped-signature transform).
#[must_use]
pub fn remove_signature_element(xml: &str) -> String {
    for (open, close) in [
        ("<ds:Signature", "</ds:Signature>"),
        ("<Signature", "</Signature>"),
    ] {
        if let Some(start) = xml.find(open) {
            if let Some(end_offset) = xml[start..].find(close) {
                let end = start + end_offset + close.len();
                return format!("{}{}", &xml[..start], &xml[end..]);
            }
        }
    }
    xml.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_tree() {
        let xml = r#"<samlp:Response ID="_r1" xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol">
            <saml:Issuer>https://idp.example.com</saml:Issuer>
            <samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status>
        </samlp:Response>"#;

        let root = XmlElement::parse(xml).unwrap();
        assert_eq!(root.name, "Response");
        assert_eq!(root.attr("ID"), Some("_r1"));
        assert_eq!(
            root.child("Issuer").unwrap().text_trimmed(),
            "https://idp.example.com"
        );
        let status = root.child("Status").unwrap();
        assert_eq!(
            status.child("StatusCode").unwrap().attr("Value"),
            Some("urn:oasis:names:tc:SAML:2.0:status:Success")
        );
    }

    #[test]
    fn parse_unescapes_text_and_attributes() {
        let xml = r#"<Attribute Name="a&amp;b"><Value>x &lt; y</Value></Attribute>"#;
        let root = XmlElement::parse(xml).unwrap();
        assert_eq!(root.attr("Name"), Some("a&b"));
        assert_eq!(root.child("Value").unwrap().text_trimmed(), "x < y");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(XmlElement::parse("").is_err());
        assert!(XmlElement::parse("<a><b></a>").is_err());
    }

    #[test]
    fn repeated_children() {
        let xml = "<Conditions><AudienceRestriction/><AudienceRestriction/></Conditions>";
        let root = XmlElement::parse(xml).unwrap();
        assert_eq!(root.children_named("AudienceRestriction").count(), 2);
    }

    #[test]
    fn strip_declaration() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Root/>";
        assert_eq!(strip_xml_declaration(xml), "<Root/>");
        assert_eq!(strip_xml_declaration("<Root/>"), "<Root/>");
    }

    #[test]
    fn extract_by_id_takes_raw_slice() {
        let xml = r#"<Outer><saml:Assertion ID="_a1" Version="2.0"><saml:Issuer>idp</saml:Issuer></saml:Assertion></Outer>"#;
        let slice = extract_element_by_id(xml, "_a1").unwrap();
        assert!(slice.starts_with("<saml:Assertion"));
        assert!(slice.ends_with("</saml:Assertion>"));
        assert!(extract_element_by_id(xml, "_missing").is_none());
    }

    #[test]
    fn extract_by_id_handles_self_closing() {
        let xml = r#"<Outer><Item ID="_i1"/><Other/></Outer>"#;
        assert_eq!(
            extract_element_by_id(xml, "_i1").unwrap(),
            r#"<Item ID="_i1"/>"#
        );
    }

    #[test]
    fn remove_signature() {
        let xml = "<Root><ds:Signature>sig</ds:Signature><Data>content</Data></Root>";
        let cleaned = remove_signature_element(xml);
        assert!(!cleaned.contains("Signature"));
        assert!(cleaned.contains("<Data>content</Data>"));
    }

    #[test]
    fn escape_round() {
        assert_eq!(escape_xml("a<b&c\"d"), "a&lt;b&amp;c&quot;d");
    }
}
