//! PPTX encoder for laid-out slide decks.

use quick_xml::escape::escape;
use slides_core::layout::{PlacedImage, SlideDescription, TextBox, TextRole};
use slides_core::{Alignment, Deck, Error, ImageData, PresentationEncoder, Result, Rgb};
use std::fmt::Write as _;
use std::io::{Cursor, Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::template;

/// Font sizes in DrawingML are hundredths of a point.
const CENTIPOINTS: u32 = 100;

/// First id in `p:sldIdLst`; lower values are reserved.
const FIRST_SLIDE_ID: usize = 256;

fn xml_error(e: std::fmt::Error) -> Error {
    Error::Encode(e.to_string())
}

fn zip_error(e: zip::result::ZipError) -> Error {
    Error::ZipError(e.to_string())
}

/// DrawingML value of `a:pPr/@algn`.
fn alignment_value(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "l",
        Alignment::Center => "ctr",
        Alignment::Right => "r",
        Alignment::Justify => "just",
        Alignment::JustifyLow => "justLow",
    }
}

/// Images embedded in the package, stored once however often they are used.
#[derive(Debug, Default)]
struct MediaStore {
    items: Vec<ImageData>,
}

impl MediaStore {
    /// Register an image and return its file name under `ppt/media/`.
    fn add(&mut self, image: &ImageData) -> String {
        let index = match self.items.iter().position(|item| item == image) {
            Some(index) => index,
            None => {
                self.items.push(image.clone());
                self.items.len() - 1
            }
        };
        Self::file_name(index, &self.items[index])
    }

    fn file_name(index: usize, image: &ImageData) -> String {
        format!("image{}.{}", index + 1, image.format.extension())
    }
}

/// Builds one slide part and its relationships.
struct SlideBuilder<'a> {
    xml: String,
    next_shape_id: u32,
    rels: Vec<(String, &'static str, String)>,
    media: &'a mut MediaStore,
}

impl<'a> SlideBuilder<'a> {
    fn new(layout: &str, media: &'a mut MediaStore) -> Self {
        Self {
            xml: String::with_capacity(4096),
            next_shape_id: 2,
            rels: vec![(
                "rId1".to_string(),
                template::REL_SLIDE_LAYOUT,
                format!("../slideLayouts/{}", layout),
            )],
            media,
        }
    }

    fn shape_id(&mut self) -> u32 {
        let id = self.next_shape_id;
        self.next_shape_id += 1;
        id
    }

    fn begin(&mut self, background_color: Rgb) -> Result<()> {
        self.xml.push_str(&template::root_open("sld"));
        self.xml.push('>');
        self.xml.push_str("<p:cSld>");
        self.xml.push_str("<p:bg><p:bgPr><a:solidFill>");
        write!(self.xml, r#"<a:srgbClr val="{}"/>"#, background_color.to_hex()).map_err(xml_error)?;
        self.xml.push_str("</a:solidFill><a:effectLst/></p:bgPr></p:bg>");
        self.xml.push_str("<p:spTree>");
        self.xml.push_str(template::GROUP_PROPERTIES);
        Ok(())
    }

    fn finish(mut self) -> (String, String) {
        self.xml.push_str("</p:spTree>");
        self.xml.push_str("</p:cSld>");
        self.xml.push_str(r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>"#);
        self.xml.push_str("</p:sld>");

        let mut rels = String::with_capacity(512);
        rels.push_str(template::XML_DECLARATION);
        rels.push_str(&format!(
            r#"<Relationships xmlns="{}">"#,
            template::NS_PACKAGE_RELATIONSHIPS
        ));
        for (id, rel_type, target) in &self.rels {
            rels.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                id, rel_type, target
            ));
        }
        rels.push_str("</Relationships>");

        (self.xml, rels)
    }

    fn write_picture(&mut self, placed: &PlacedImage, name: &str) -> Result<()> {
        let file_name = self.media.add(&placed.image);
        let rel_id = format!("rId{}", self.rels.len() + 1);
        self.rels
            .push((rel_id.clone(), template::REL_IMAGE, format!("../media/{}", file_name)));

        let id = self.shape_id();
        self.xml.push_str("<p:pic>");
        self.xml.push_str("<p:nvPicPr>");
        write!(self.xml, r#"<p:cNvPr id="{}" name="{}"/>"#, id, name).map_err(xml_error)?;
        self.xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr>"#);
        self.xml.push_str("<p:nvPr/>");
        self.xml.push_str("</p:nvPicPr>");

        self.xml.push_str("<p:blipFill>");
        write!(self.xml, r#"<a:blip r:embed="{}"/>"#, rel_id).map_err(xml_error)?;
        self.xml.push_str("<a:stretch><a:fillRect/></a:stretch>");
        self.xml.push_str("</p:blipFill>");

        self.xml.push_str("<p:spPr>");
        self.write_frame(placed.frame)?;
        self.xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
        self.xml.push_str("</p:spPr>");
        self.xml.push_str("</p:pic>");
        Ok(())
    }

    fn write_frame(&mut self, frame: slides_core::Rect) -> Result<()> {
        self.xml.push_str("<a:xfrm>");
        write!(self.xml, r#"<a:off x="{}" y="{}"/>"#, frame.x, frame.y).map_err(xml_error)?;
        write!(self.xml, r#"<a:ext cx="{}" cy="{}"/>"#, frame.width, frame.height)
            .map_err(xml_error)?;
        self.xml.push_str("</a:xfrm>");
        Ok(())
    }

    fn write_text_box(&mut self, text_box: &TextBox) -> Result<()> {
        let id = self.shape_id();
        self.xml.push_str("<p:sp>");
        self.xml.push_str("<p:nvSpPr>");
        match text_box.role {
            TextRole::Title => {
                write!(self.xml, r#"<p:cNvPr id="{}" name="Title"/>"#, id).map_err(xml_error)?;
                self.xml.push_str(r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>"#);
                self.xml.push_str(r#"<p:nvPr><p:ph type="ctrTitle"/></p:nvPr>"#);
            }
            TextRole::Subtitle => {
                write!(self.xml, r#"<p:cNvPr id="{}" name="Subtitle"/>"#, id).map_err(xml_error)?;
                self.xml.push_str(r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>"#);
                self.xml.push_str(r#"<p:nvPr><p:ph type="subTitle" idx="1"/></p:nvPr>"#);
            }
            TextRole::Body => {
                write!(self.xml, r#"<p:cNvPr id="{}" name="Lyrics"/>"#, id).map_err(xml_error)?;
                self.xml.push_str(r#"<p:cNvSpPr txBox="1"/>"#);
                self.xml.push_str("<p:nvPr/>");
            }
        }
        self.xml.push_str("</p:nvSpPr>");

        self.xml.push_str("<p:spPr>");
        self.write_frame(text_box.frame)?;
        if text_box.role == TextRole::Body {
            self.xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/>"#);
        }
        self.xml.push_str("</p:spPr>");

        self.xml.push_str("<p:txBody>");
        if text_box.role == TextRole::Body {
            self.xml.push_str(r#"<a:bodyPr wrap="square" rtlCol="0"><a:normAutofit/></a:bodyPr>"#);
        } else {
            self.xml.push_str("<a:bodyPr/>");
        }
        self.xml.push_str("<a:lstStyle/>");
        self.write_paragraph(text_box)?;
        self.xml.push_str("</p:txBody>");
        self.xml.push_str("</p:sp>");
        Ok(())
    }

    /// One paragraph; line breaks inside the text become `a:br`.
    fn write_paragraph(&mut self, text_box: &TextBox) -> Result<()> {
        let format = &text_box.format;
        let run_properties = run_properties(text_box)?;

        self.xml.push_str("<a:p>");

        let has_spacing = format.line_spacing_pt.is_some()
            || format.space_before_pt.is_some()
            || format.space_after_pt.is_some();
        if format.alignment.is_some() || has_spacing {
            self.xml.push_str("<a:pPr");
            if let Some(alignment) = format.alignment {
                write!(self.xml, r#" algn="{}""#, alignment_value(alignment)).map_err(xml_error)?;
            }
            self.xml.push('>');
            for (element, points) in [
                ("lnSpc", format.line_spacing_pt),
                ("spcBef", format.space_before_pt),
                ("spcAft", format.space_after_pt),
            ] {
                if let Some(points) = points {
                    write!(
                        self.xml,
                        r#"<a:{0}><a:spcPts val="{1}"/></a:{0}>"#,
                        element,
                        points.saturating_mul(CENTIPOINTS)
                    )
                    .map_err(xml_error)?;
                }
            }
            self.xml.push_str("</a:pPr>");
        }

        for (i, line) in xml_text(&text_box.text).split('\n').enumerate() {
            if i > 0 {
                write!(self.xml, "<a:br>{}</a:br>", run_properties).map_err(xml_error)?;
            }
            if !line.is_empty() {
                write!(self.xml, "<a:r>{}<a:t>{}</a:t></a:r>", run_properties, escape(line))
                    .map_err(xml_error)?;
            }
        }

        self.xml.push_str("</a:p>");
        Ok(())
    }
}

/// Text with XML-illegal characters removed; a vertical tab is a line break.
fn xml_text(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\u{0b}' => Some('\n'),
            '\n' | '\t' => Some(c),
            '\u{fffe}' | '\u{ffff}' => None,
            c if c.is_control() && (c as u32) < 0x20 => None,
            c => Some(c),
        })
        .collect()
}

fn run_properties(text_box: &TextBox) -> Result<String> {
    let font = &text_box.format.font;
    let mut xml = String::with_capacity(256);
    write!(
        xml,
        r#"<a:rPr lang="en-US" sz="{}" b="{}" dirty="0">"#,
        font.size_pt.saturating_mul(CENTIPOINTS),
        if font.bold { 1 } else { 0 }
    )
    .map_err(xml_error)?;
    write!(
        xml,
        r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#,
        font.color.to_hex()
    )
    .map_err(xml_error)?;
    write!(xml, r#"<a:latin typeface="{}"/>"#, escape(font.name.as_str())).map_err(xml_error)?;
    xml.push_str("</a:rPr>");
    Ok(xml)
}

/// Encoder producing `.pptx` packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct PptxWriter;

impl PptxWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write the whole package into `writer` and hand it back.
    pub fn write<W: Write + Seek>(&self, deck: &Deck, writer: W) -> Result<W> {
        let mut media = MediaStore::default();
        let mut slides = Vec::with_capacity(deck.slides.len());
        for slide in &deck.slides {
            slides.push(self.slide_part(slide, deck.background_color, &mut media)?);
        }

        let formats: Vec<_> = media.items.iter().map(|image| image.format).collect();

        let mut zip = ZipWriter::new(writer);
        let xml_options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let media_options = FileOptions::default().compression_method(CompressionMethod::Stored);

        let mut add = |name: String, bytes: &[u8], options: FileOptions| -> Result<()> {
            zip.start_file(name, options).map_err(zip_error)?;
            zip.write_all(bytes)?;
            Ok(())
        };

        add(
            "[Content_Types].xml".to_string(),
            template::content_types(slides.len(), &formats).as_bytes(),
            xml_options,
        )?;
        add("_rels/.rels".to_string(), template::root_rels().as_bytes(), xml_options)?;
        add(
            "ppt/presentation.xml".to_string(),
            self.presentation_xml(deck)?.as_bytes(),
            xml_options,
        )?;
        add(
            "ppt/_rels/presentation.xml.rels".to_string(),
            presentation_rels(slides.len()).as_bytes(),
            xml_options,
        )?;
        add("ppt/presProps.xml".to_string(), template::pres_props().as_bytes(), xml_options)?;
        add(
            "ppt/slideMasters/slideMaster1.xml".to_string(),
            template::slide_master().as_bytes(),
            xml_options,
        )?;
        add(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels".to_string(),
            template::slide_master_rels().as_bytes(),
            xml_options,
        )?;
        for (layout, xml) in [
            (template::TITLE_LAYOUT, template::title_layout()),
            (template::BLANK_LAYOUT, template::blank_layout()),
        ] {
            add(format!("ppt/slideLayouts/{}", layout), xml.as_bytes(), xml_options)?;
            add(
                format!("ppt/slideLayouts/_rels/{}.rels", layout),
                template::layout_rels().as_bytes(),
                xml_options,
            )?;
        }
        add("ppt/theme/theme1.xml".to_string(), template::theme().as_bytes(), xml_options)?;

        for (i, (xml, rels)) in slides.iter().enumerate() {
            add(format!("ppt/slides/slide{}.xml", i + 1), xml.as_bytes(), xml_options)?;
            add(
                format!("ppt/slides/_rels/slide{}.xml.rels", i + 1),
                rels.as_bytes(),
                xml_options,
            )?;
        }

        for (i, image) in media.items.iter().enumerate() {
            add(
                format!("ppt/media/{}", MediaStore::file_name(i, image)),
                &image.bytes,
                media_options,
            )?;
        }

        let writer = zip.finish().map_err(zip_error)?;
        log::debug!(
            "Encoded {} slides with {} media files",
            deck.slides.len(),
            media.items.len()
        );
        Ok(writer)
    }

    fn presentation_xml(&self, deck: &Deck) -> Result<String> {
        let mut xml = template::root_open("presentation");
        xml.push_str(r#" saveSubsetFonts="1">"#);

        xml.push_str("<p:sldMasterIdLst>");
        xml.push_str(r#"<p:sldMasterId id="2147483648" r:id="rId1"/>"#);
        xml.push_str("</p:sldMasterIdLst>");

        if !deck.slides.is_empty() {
            xml.push_str("<p:sldIdLst>");
            for i in 0..deck.slides.len() {
                write!(
                    xml,
                    r#"<p:sldId id="{}" r:id="{}"/>"#,
                    FIRST_SLIDE_ID + i,
                    slide_rel_id(i)
                )
                .map_err(xml_error)?;
            }
            xml.push_str("</p:sldIdLst>");
        }

        write!(
            xml,
            r#"<p:sldSz cx="{}" cy="{}"/>"#,
            deck.canvas.width, deck.canvas.height
        )
        .map_err(xml_error)?;
        xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
        xml.push_str("</p:presentation>");
        Ok(xml)
    }

    fn slide_part(
        &self,
        slide: &SlideDescription,
        background_color: Rgb,
        media: &mut MediaStore,
    ) -> Result<(String, String)> {
        let layout = match slide {
            SlideDescription::Title(_) => template::TITLE_LAYOUT,
            SlideDescription::Text(_) => template::BLANK_LAYOUT,
        };
        let mut builder = SlideBuilder::new(layout, media);
        builder.begin(background_color)?;

        // Drawn first so it stays behind the text.
        if let Some(background) = slide.background() {
            builder.write_picture(background, "Background")?;
        }

        match slide {
            SlideDescription::Title(title) => {
                builder.write_text_box(&title.title)?;
                builder.write_text_box(&title.subtitle)?;
                if let Some(art) = &title.foreground {
                    builder.write_picture(art, "Title Art")?;
                }
            }
            SlideDescription::Text(text) => builder.write_text_box(&text.body)?,
        }

        Ok(builder.finish())
    }
}

/// Slides follow the master (rId1), the theme (rId2) and the properties (rId3).
fn slide_rel_id(index: usize) -> String {
    format!("rId{}", index + 4)
}

fn presentation_rels(slide_count: usize) -> String {
    let mut xml = String::with_capacity(1024);
    xml.push_str(template::XML_DECLARATION);
    xml.push_str(&format!(
        r#"<Relationships xmlns="{}">"#,
        template::NS_PACKAGE_RELATIONSHIPS
    ));
    xml.push_str(&format!(
        r#"<Relationship Id="rId1" Type="{}" Target="slideMasters/slideMaster1.xml"/>"#,
        template::REL_SLIDE_MASTER
    ));
    xml.push_str(&format!(
        r#"<Relationship Id="rId2" Type="{}" Target="theme/theme1.xml"/>"#,
        template::REL_THEME
    ));
    xml.push_str(&format!(
        r#"<Relationship Id="rId3" Type="{}" Target="presProps.xml"/>"#,
        template::REL_PRES_PROPS
    ));
    for i in 0..slide_count {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="slides/slide{}.xml"/>"#,
            slide_rel_id(i),
            template::REL_SLIDE,
            i + 1
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

impl PresentationEncoder for PptxWriter {
    fn encode(&self, deck: &Deck) -> Result<Vec<u8>> {
        Ok(self.write(deck, Cursor::new(Vec::new()))?.into_inner())
    }
}
