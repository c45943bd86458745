//! Thin RDF/XML element writer on top of `quick_xml`.
//!
//! Knows the CGMES conventions (namespace prefixes, `rdf:ID` / `rdf:about` / `rdf:resource`
//! forms, `Class.attribute` property names) but nothing about profiles.

use super::context::ModelDescription;
use super::error::ExportResult;
use super::naming::{format_double, to_master_resource_id, to_rdf_id};
use super::profile::{CimVersion, Profile, ENTSOE_NAMESPACE, MD_NAMESPACE, RDF_NAMESPACE};
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

pub struct CimWriter<W: Write> {
    writer: Writer<W>,
    cim_version: CimVersion,
}

impl<W: Write> CimWriter<W> {
    pub fn new(inner: W, cim_version: CimVersion, indent: bool) -> Self {
        let writer = if indent {
            Writer::new_with_indent(inner, b' ', 2)
        } else {
            Writer::new(inner)
        };
        Self {
            writer,
            cim_version,
        }
    }

    pub fn cim_version(&self) -> CimVersion {
        self.cim_version
    }

    /// XML declaration and the `rdf:RDF` root with its namespace bindings
    pub fn start_document(&mut self) -> ExportResult<()> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        let mut root = BytesStart::new("rdf:RDF");
        root.push_attribute(("xmlns:cim", self.cim_version.namespace()));
        root.push_attribute(("xmlns:entsoe", ENTSOE_NAMESPACE));
        root.push_attribute(("xmlns:md", MD_NAMESPACE));
        root.push_attribute(("xmlns:rdf", RDF_NAMESPACE));
        self.writer.write_event(Event::Start(root))?;
        Ok(())
    }

    /// The `md:FullModel` header of a profile document
    pub fn write_model_header(
        &mut self,
        profile: Profile,
        model: &ModelDescription,
        scenario_time: DateTime<Utc>,
        created: DateTime<Utc>,
    ) -> ExportResult<()> {
        let mut header = BytesStart::new("md:FullModel");
        header.push_attribute(("rdf:about", model.id.as_str()));
        self.writer.write_event(Event::Start(header))?;

        self.property(
            "md:Model.scenarioTime",
            &scenario_time.to_rfc3339_opts(SecondsFormat::Secs, true),
        )?;
        self.property(
            "md:Model.created",
            &created.to_rfc3339_opts(SecondsFormat::Secs, true),
        )?;
        self.property("md:Model.description", &model.description)?;
        self.property("md:Model.version", &model.version.to_string())?;
        for dependency in &model.dependencies {
            self.resource("md:Model.DependentOn", dependency)?;
        }
        self.property("md:Model.profile", self.cim_version.profile_uri(profile))?;
        self.property(
            "md:Model.modelingAuthoritySet",
            &model.modeling_authority_set,
        )?;

        self.writer
            .write_event(Event::End(BytesEnd::new("md:FullModel")))?;
        Ok(())
    }

    /// Open an object defined by this document (`rdf:ID`)
    pub fn start_object(&mut self, class: &str, id: &str) -> ExportResult<()> {
        let mut elem = BytesStart::new(format!("cim:{}", class));
        elem.push_attribute(("rdf:ID", to_rdf_id(id).as_str()));
        self.writer.write_event(Event::Start(elem))?;
        Ok(())
    }

    /// Open a description of an object defined in another document (`rdf:about`)
    pub fn start_object_about(&mut self, class: &str, id: &str) -> ExportResult<()> {
        let mut elem = BytesStart::new(format!("cim:{}", class));
        elem.push_attribute(("rdf:about", format!("#{}", to_rdf_id(id)).as_str()));
        self.writer.write_event(Event::Start(elem))?;
        Ok(())
    }

    pub fn end_object(&mut self, class: &str) -> ExportResult<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(format!("cim:{}", class))))?;
        Ok(())
    }

    /// `IdentifiedObject.mRID` (unprefixed form) and `IdentifiedObject.name`
    pub fn identified_object(&mut self, id: &str, name: &str) -> ExportResult<()> {
        self.text("IdentifiedObject", "mRID", to_master_resource_id(id))?;
        self.text("IdentifiedObject", "name", name)
    }

    pub fn text(&mut self, class: &str, attribute: &str, value: &str) -> ExportResult<()> {
        self.property(&format!("cim:{}.{}", class, attribute), value)
    }

    pub fn double(&mut self, class: &str, attribute: &str, value: f64) -> ExportResult<()> {
        self.text(class, attribute, &format_double(value))
    }

    pub fn integer(&mut self, class: &str, attribute: &str, value: i64) -> ExportResult<()> {
        self.text(class, attribute, &value.to_string())
    }

    pub fn boolean(&mut self, class: &str, attribute: &str, value: bool) -> ExportResult<()> {
        self.text(class, attribute, if value { "true" } else { "false" })
    }

    /// Reference to another object by id
    pub fn reference(&mut self, class: &str, attribute: &str, id: &str) -> ExportResult<()> {
        self.resource(
            &format!("cim:{}.{}", class, attribute),
            &format!("#{}", to_rdf_id(id)),
        )
    }

    /// Reference to an enumeration literal, e.g. `("Switch", "kind", "SwitchKind.breaker")`
    pub fn enum_value(&mut self, class: &str, attribute: &str, literal: &str) -> ExportResult<()> {
        self.resource(
            &format!("cim:{}.{}", class, attribute),
            &format!("{}{}", self.cim_version.namespace(), literal),
        )
    }

    /// Close the root element and hand back the underlying sink
    pub fn end_document(mut self) -> ExportResult<W> {
        self.writer
            .write_event(Event::End(BytesEnd::new("rdf:RDF")))?;
        let mut inner = self.writer.into_inner();
        inner.write_all(b"\n")?;
        inner.flush()?;
        Ok(inner)
    }

    fn property(&mut self, name: &str, value: &str) -> ExportResult<()> {
        self.writer.write_event(Event::Start(BytesStart::new(name)))?;
        self.writer.write_event(Event::Text(BytesText::new(value)))?;
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn resource(&mut self, name: &str, target: &str) -> ExportResult<()> {
        let mut elem = BytesStart::new(name);
        elem.push_attribute(("rdf:resource", target));
        self.writer.write_event(Event::Empty(elem))?;
        Ok(())
    }
}
