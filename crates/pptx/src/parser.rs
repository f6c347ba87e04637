//! PPTX package reader: slide order, slide size and shape records.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use slides_core::{Error, Rect, Result};
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::ZipArchive;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

/// A relationship entry from a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

/// Placeholder reference of a shape (`p:nvPr/p:ph`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholder {
    pub ph_type: Option<String>,
    pub idx: Option<u32>,
}

impl Placeholder {
    pub fn is_title(&self) -> bool {
        matches!(self.ph_type.as_deref(), Some("title") | Some("ctrTitle"))
    }

    pub fn is_subtitle(&self) -> bool {
        self.ph_type.as_deref() == Some("subTitle") || self.idx == Some(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Text,
    Picture,
}

/// One shape of a slide, in drawing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeRecord {
    pub kind: ShapeKind,
    pub name: String,
    pub placeholder: Option<Placeholder>,
    pub frame: Option<Rect>,
    /// Paragraph texts; `a:br` is kept as `\n`.
    pub paragraphs: Vec<String>,
    /// Relationship id of the picture (`a:blip/@r:embed`).
    pub embed: Option<String>,
}

impl ShapeRecord {
    fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            name: String::new(),
            placeholder: None,
            frame: None,
            paragraphs: Vec::new(),
            embed: None,
        }
    }

    /// Full text, paragraphs separated by newlines.
    pub fn text(&self) -> String {
        self.paragraphs.join("\n")
    }

    pub fn has_text(&self) -> bool {
        self.paragraphs.iter().any(|p| !p.trim().is_empty())
    }
}

/// A parsed slide part.
#[derive(Debug, Clone)]
pub struct ParsedSlide {
    pub path: String,
    pub shapes: Vec<ShapeRecord>,
    /// Relationship id to package part path.
    pub targets: HashMap<String, String>,
}

/// Read access to the parts of a `.pptx` archive.
pub struct PackageReader<R> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> PackageReader<R> {
    pub fn new(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;
        Ok(Self { archive })
    }

    /// Read a part as UTF-8 text.
    pub fn read_string(&mut self, path: &str) -> Result<String> {
        let mut file = self
            .archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }

    /// Read a binary part such as an image.
    pub fn read_bytes(&mut self, path: &str) -> Result<Vec<u8>> {
        let mut file = self
            .archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }

    fn has_part(&self, path: &str) -> bool {
        self.archive.file_names().any(|name| name == path)
    }

    /// Slide width and height in EMU from `p:sldSz`.
    pub fn slide_size(&mut self) -> Result<Option<(i64, i64)>> {
        let xml = self.read_string(PRESENTATION_PART)?;
        let mut reader = Reader::from_str(&xml);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if local_name(e.name().as_ref()) == b"sldSz" =>
                {
                    let cx = attribute(e, b"cx").and_then(|v| v.parse().ok());
                    let cy = attribute(e, b"cy").and_then(|v| v.parse().ok());
                    return Ok(cx.zip(cy));
                }
                Ok(Event::Eof) => return Ok(None),
                Err(e) => {
                    return Err(Error::XmlError(format!("Error parsing presentation: {}", e)));
                }
                _ => {}
            }
        }
    }

    /// Slide part paths in presentation order.
    ///
    /// Follows `p:sldIdLst`; packages without one fall back to the
    /// numbers in relationship ids and part names.
    pub fn slide_order(&mut self) -> Result<Vec<String>> {
        let rels = parse_relationships(&self.read_string(PRESENTATION_RELS)?)?;
        let slide_rels: Vec<&Relationship> = rels.iter().filter(|r| is_slide_relationship(r)).collect();

        let targets: HashMap<&str, String> = slide_rels
            .iter()
            .map(|r| (r.id.as_str(), resolve_target("ppt", &r.target)))
            .collect();

        let listed: Vec<String> = parse_slide_ids(&self.read_string(PRESENTATION_PART)?)?
            .iter()
            .filter_map(|id| targets.get(id.as_str()).cloned())
            .collect();
        if !listed.is_empty() {
            return Ok(listed);
        }

        log::debug!("No slide id list, ordering {} slides by number", slide_rels.len());
        let mut slides: Vec<(String, Option<usize>)> = slide_rels
            .iter()
            .map(|r| {
                let order = extract_slide_number(&r.id).or_else(|| extract_slide_number(&r.target));
                (resolve_target("ppt", &r.target), order)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Parse one slide part together with its relationships.
    pub fn slide(&mut self, path: &str) -> Result<ParsedSlide> {
        let xml = self.read_string(path)?;
        let shapes = parse_shapes(&xml)?;

        let (dir, file) = path.rsplit_once('/').unwrap_or(("", path));
        let rels_path = format!("{}/_rels/{}.rels", dir, file);
        let targets = if self.has_part(&rels_path) {
            parse_relationships(&self.read_string(&rels_path)?)?
                .into_iter()
                .map(|r| (r.id, resolve_target(dir, &r.target)))
                .collect()
        } else {
            HashMap::new()
        };

        Ok(ParsedSlide {
            path: path.to_string(),
            shapes,
            targets,
        })
    }
}

fn is_slide_relationship(rel: &Relationship) -> bool {
    rel.rel_type.ends_with("/slide")
}

/// Parse a `.rels` part.
pub fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut rels = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                rels.push(Relationship {
                    id: attribute(e, b"Id").unwrap_or_default(),
                    rel_type: attribute(e, b"Type").unwrap_or_default(),
                    target: attribute(e, b"Target").unwrap_or_default(),
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing relationships: {}", e)));
            }
            _ => {}
        }
    }

    Ok(rels)
}

/// Relationship ids from `p:sldIdLst`, in order.
fn parse_slide_ids(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                if let Some(id) = r_id(e) {
                    ids.push(id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing presentation: {}", e)));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// The namespaced `r:id` attribute.
fn r_id(e: &BytesStart) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"r:id")
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Parse the shapes of a slide in drawing order.
pub fn parse_shapes(xml: &str) -> Result<Vec<ShapeRecord>> {
    let mut shapes = Vec::new();
    let mut reader = Reader::from_str(xml);

    let mut current: Option<ShapeRecord> = None;
    let mut in_text_body = false;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => current = Some(ShapeRecord::new(ShapeKind::Text)),
                b"pic" => current = Some(ShapeRecord::new(ShapeKind::Picture)),
                b"txBody" => in_text_body = true,
                b"p" if in_text_body => {
                    if let Some(shape) = current.as_mut() {
                        shape.paragraphs.push(String::new());
                    }
                }
                b"t" if in_text_body => in_text = true,
                other => apply_element(current.as_mut(), other, e),
            },
            Ok(Event::Empty(ref e)) => {
                let qname = e.name();
                let name = local_name(qname.as_ref());
                if name == b"p" && in_text_body {
                    if let Some(shape) = current.as_mut() {
                        shape.paragraphs.push(String::new());
                    }
                } else {
                    apply_element(current.as_mut(), name, e);
                }
            }
            Ok(Event::Text(ref e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|e| Error::XmlError(format!("Error reading slide text: {}", e)))?;
                if let Some(paragraph) = current.as_mut().and_then(|s| s.paragraphs.last_mut()) {
                    paragraph.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" | b"pic" => {
                    if let Some(shape) = current.take() {
                        shapes.push(shape);
                    }
                    in_text_body = false;
                    in_text = false;
                }
                b"txBody" => in_text_body = false,
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML parsing error, keeping {} shapes: {}", shapes.len(), e);
                break;
            }
            _ => {}
        }
    }

    Ok(shapes)
}

/// Record what an element says about the enclosing shape.
fn apply_element(shape: Option<&mut ShapeRecord>, name: &[u8], e: &BytesStart) {
    let Some(shape) = shape else {
        return;
    };

    match name {
        b"cNvPr" => {
            if let Some(value) = attribute(e, b"name") {
                shape.name = value;
            }
        }
        b"ph" => {
            shape.placeholder = Some(Placeholder {
                ph_type: attribute(e, b"type"),
                idx: attribute(e, b"idx").and_then(|v| v.parse().ok()),
            });
        }
        b"off" => {
            let x = attribute(e, b"x").and_then(|v| v.parse().ok());
            let y = attribute(e, b"y").and_then(|v| v.parse().ok());
            if let (Some(x), Some(y)) = (x, y) {
                let frame = shape.frame.get_or_insert(Rect::new(0, 0, 0, 0));
                frame.x = x;
                frame.y = y;
            }
        }
        b"ext" => {
            let cx = attribute(e, b"cx").and_then(|v| v.parse().ok());
            let cy = attribute(e, b"cy").and_then(|v| v.parse().ok());
            if let (Some(cx), Some(cy)) = (cx, cy) {
                let frame = shape.frame.get_or_insert(Rect::new(0, 0, 0, 0));
                frame.width = cx;
                frame.height = cy;
            }
        }
        b"br" => {
            if let Some(paragraph) = shape.paragraphs.last_mut() {
                paragraph.push('\n');
            }
        }
        b"blip" => {
            shape.embed = attribute(e, b"embed");
        }
        _ => {}
    }
}

/// Value of the attribute whose local name is `key`.
fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| local_name(attr.key.as_ref()) == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Resolve a relationship target against the directory of its source part.
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
