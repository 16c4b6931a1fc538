//! SVG backend using a streaming XML writer.

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use crate::api::FillRule;
use crate::context::{ElementStyle, VectorSink};
use crate::error::{AxialError, Result};
use crate::geometry::format_number;

/// A streaming SVG document. Elements are written as they are emitted;
/// clip-path ids are numbered per document (`clip0`, `clip1`, ...).
pub struct SvgDocument<W: Write> {
    writer: Writer<W>,
    open_root: bool,
    open_groups: usize,
    clip_counter: usize,
}

impl<W: Write> SvgDocument<W> {
    /// Create a new SVG document that writes into the provided sink, emitting the root `<svg>`.
    /// Width/height are expressed in CSS pixels; a matching `viewBox` is set.
    pub fn new(inner: W, width: f64, height: f64) -> Result<Self> {
        let mut writer = Writer::new_with_indent(inner, b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let width_attr = format_number(width);
        let height_attr = format_number(height);
        let view_box_attr = format!("0 0 {} {}", width_attr, height_attr);

        let mut start = BytesStart::new("svg");
        start.push_attribute(("xmlns", "http://www.w3.org/2000/svg"));
        start.push_attribute(("version", "1.1"));
        start.push_attribute(("width", width_attr.as_str()));
        start.push_attribute(("height", height_attr.as_str()));
        start.push_attribute(("viewBox", view_box_attr.as_str()));
        writer.write_event(Event::Start(start))?;

        Ok(Self {
            writer,
            open_root: true,
            open_groups: 0,
            clip_counter: 0,
        })
    }

    /// Finish the document, closing any open groups and the root element,
    /// and return the inner writer.
    pub fn finish(mut self) -> Result<W> {
        while self.open_groups > 0 {
            self.end_group()?;
        }
        if self.open_root {
            self.writer.write_event(Event::End(BytesEnd::new("svg")))?;
            self.open_root = false;
        }
        Ok(self.writer.into_inner())
    }

    fn write_empty(&mut self, elem: BytesStart<'_>) -> Result<()> {
        self.writer.write_event(Event::Empty(elem))?;
        Ok(())
    }

    fn start(&mut self, elem: BytesStart<'_>) -> Result<()> {
        self.writer.write_event(Event::Start(elem))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }
}

impl<W: Write> VectorSink for SvgDocument<W> {
    fn path(&mut self, d: &str, style: &ElementStyle) -> Result<()> {
        let stroke_width_attr = format_number(style.stroke_width);
        let opacity_attr = format_number(style.opacity);
        let mut elem = BytesStart::new("path");
        elem.push_attribute(("d", d));
        elem.push_attribute(("stroke", style.stroke.as_deref().unwrap_or("transparent")));
        elem.push_attribute(("fill", style.fill.as_deref().unwrap_or("transparent")));
        elem.push_attribute(("stroke-width", stroke_width_attr.as_str()));
        if let Some(dash) = &style.dash {
            let dash = dash.iter().map(|v| format_number(*v)).collect::<Vec<_>>().join(",");
            elem.push_attribute(("stroke-dasharray", dash.as_str()));
        }
        elem.push_attribute(("opacity", opacity_attr.as_str()));
        if !style.pointer_events {
            elem.push_attribute(("style", "pointer-events: none"));
        }
        self.write_empty(elem)
    }

    fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: &str) -> Result<()> {
        let cx_attr = format_number(cx);
        let cy_attr = format_number(cy);
        let r_attr = format_number(r);
        let mut elem = BytesStart::new("circle");
        elem.push_attribute(("cx", cx_attr.as_str()));
        elem.push_attribute(("cy", cy_attr.as_str()));
        elem.push_attribute(("r", r_attr.as_str()));
        elem.push_attribute(("fill", fill));
        self.write_empty(elem)
    }

    fn begin_clip(&mut self, d: &str, rule: FillRule) -> Result<String> {
        let id = format!("clip{}", self.clip_counter);
        self.clip_counter += 1;

        self.start(BytesStart::new("defs"))?;
        let mut clip_path = BytesStart::new("clipPath");
        clip_path.push_attribute(("id", id.as_str()));
        clip_path.push_attribute(("clip-rule", rule.as_svg()));
        self.start(clip_path)?;
        let mut path = BytesStart::new("path");
        path.push_attribute(("d", d));
        self.write_empty(path)?;
        self.end("clipPath")?;
        self.end("defs")?;

        let url = format!("url(#{id})");
        let mut group = BytesStart::new("g");
        group.push_attribute(("clip-path", url.as_str()));
        self.start(group)?;
        self.open_groups += 1;
        Ok(id)
    }

    fn begin_group(&mut self, transform: Option<&str>, pointer_events: bool) -> Result<()> {
        let mut group = BytesStart::new("g");
        if let Some(transform) = transform {
            group.push_attribute(("transform", transform));
        }
        if !pointer_events {
            group.push_attribute(("style", "pointer-events: none"));
        }
        self.start(group)?;
        self.open_groups += 1;
        Ok(())
    }

    fn end_group(&mut self) -> Result<()> {
        if self.open_groups == 0 {
            return Err(AxialError::invalid_input("end_group without an open group"));
        }
        self.open_groups -= 1;
        self.end("g")
    }
}
