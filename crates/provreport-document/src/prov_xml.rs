//! PROV-XML encoding (written with `quick-xml`).
//!
//! Elements carry `prov:id`; relation members point at them with `prov:ref`.
//! Attributes outside the `prov:` namespace are written unprefixed and land
//! in the document's default namespace.

use crate::model::{format_time, AttrValue, Attributes, Element, Relation, Term};
use crate::report::RenderError;
use crate::{ProvDocument, Record, PROV_ROLE};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

const PROV_NS: &str = "http://www.w3.org/ns/prov#";
const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

fn xml_err(e: impl std::fmt::Display) -> RenderError {
    RenderError::Xml(e.to_string())
}

struct ProvXmlWriter {
    inner: Writer<Vec<u8>>,
}

impl ProvXmlWriter {
    fn new() -> Self {
        Self {
            inner: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), RenderError> {
        self.inner.write_event(event).map_err(xml_err)
    }

    fn text_element(
        &mut self,
        name: &str,
        xsi_type: Option<&str>,
        text: &str,
    ) -> Result<(), RenderError> {
        let mut start = BytesStart::new(name);
        if let Some(t) = xsi_type {
            start.push_attribute(("xsi:type", t));
        }
        self.event(Event::Start(start))?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn reference(&mut self, name: &str, target: &str) -> Result<(), RenderError> {
        let mut empty = BytesStart::new(name);
        empty.push_attribute(("prov:ref", target));
        self.event(Event::Empty(empty))
    }

    fn attributes(&mut self, attrs: &Attributes) -> Result<(), RenderError> {
        for (key, value) in attrs.iter() {
            match value {
                AttrValue::Str(s) => {
                    let xsi = key.starts_with("prov:").then_some("xsd:string");
                    self.text_element(key, xsi, s)?;
                }
                AttrValue::DateTime(t) => {
                    self.text_element(key, Some("xsd:dateTime"), &format_time(t))?;
                }
                AttrValue::Bool(b) => {
                    self.text_element(key, Some("xsd:boolean"), if *b { "true" } else { "false" })?;
                }
            }
        }
        Ok(())
    }

    fn element(&mut self, element: &Element) -> Result<(), RenderError> {
        let name = format!("prov:{}", element.keyword());
        let mut start = BytesStart::new(name.as_str());
        start.push_attribute(("prov:id", element.id().as_str()));

        if element.attributes().is_empty() && !matches!(element, Element::Activity(_)) {
            return self.event(Event::Empty(start));
        }

        self.event(Event::Start(start))?;
        if let Element::Activity(a) = element {
            self.text_element("prov:startTime", None, &format_time(&a.start_time))?;
            if let Some(end) = &a.end_time {
                self.text_element("prov:endTime", None, &format_time(end))?;
            }
        }
        self.attributes(element.attributes())?;
        self.event(Event::End(BytesEnd::new(name.as_str())))
    }

    fn relation(&mut self, rel: &Relation) -> Result<(), RenderError> {
        let name = format!("prov:{}", rel.kind().prov_name());
        self.event(Event::Start(BytesStart::new(name.as_str())))?;
        for (member, term) in rel.formal_terms() {
            match term {
                Term::Ref(id) => self.reference(member, id.as_str())?,
                Term::Time(t) => self.text_element(member, None, &format_time(t))?,
                Term::Absent => {}
            }
        }
        if let Some(role) = rel.role() {
            self.text_element(PROV_ROLE, Some("xsd:string"), role)?;
        }
        self.event(Event::End(BytesEnd::new(name.as_str())))
    }
}

/// Render `doc` as a PROV-XML document.
pub fn to_prov_xml(doc: &ProvDocument) -> Result<String, RenderError> {
    let mut w = ProvXmlWriter::new();
    w.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("prov:document");
    root.push_attribute(("xmlns:prov", PROV_NS));
    root.push_attribute(("xmlns:xsd", XSD_NS));
    root.push_attribute(("xmlns:xsi", XSI_NS));
    root.push_attribute(("xmlns", doc.default_namespace()));
    w.event(Event::Start(root))?;

    for record in doc.records() {
        match record {
            Record::Element(e) => w.element(e)?,
            Record::Relation(r) => w.relation(r)?,
        }
    }

    w.event(Event::End(BytesEnd::new("prov:document")))?;
    String::from_utf8(w.inner.into_inner()).map_err(xml_err)
}
