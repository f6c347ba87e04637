//! Static package parts shared by every generated presentation.
//!
//! The master carries no visible content; the title layout provides the
//! `ctrTitle` and `subTitle` placeholders, the blank layout nothing.

use slides_core::ImageFormat;
use std::fmt::Write;

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

pub const NS_PRESENTATION: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
pub const NS_DRAWING: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const NS_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const NS_PACKAGE_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";

pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
pub const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
pub const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
pub const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
pub const REL_PRES_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps";

/// Layout used by the title slide.
pub const TITLE_LAYOUT: &str = "slideLayout1.xml";
/// Layout used by text slides.
pub const BLANK_LAYOUT: &str = "slideLayout2.xml";

/// Open a `p:` root element with the three standard namespaces.
pub fn root_open(element: &str) -> String {
    format!(
        r#"{}<p:{} xmlns:a="{}" xmlns:r="{}" xmlns:p="{}""#,
        XML_DECLARATION, element, NS_DRAWING, NS_RELATIONSHIPS, NS_PRESENTATION
    )
}

/// `[Content_Types].xml` for `slide_count` slides and the given media formats.
pub fn content_types(slide_count: usize, media: &[ImageFormat]) -> String {
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECLARATION);
    xml.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    xml.push_str(
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    );
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);

    let mut seen: Vec<ImageFormat> = Vec::new();
    for format in media {
        if !seen.contains(format) {
            seen.push(*format);
            let _ = write!(
                xml,
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                format.extension(),
                format.content_type()
            );
        }
    }

    xml.push_str(r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/ppt/presProps.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presProps+xml"/>"#);
    xml.push_str(r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>"#);
    for layout in [TITLE_LAYOUT, BLANK_LAYOUT] {
        let _ = write!(
            xml,
            r#"<Override PartName="/ppt/slideLayouts/{}" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#,
            layout
        );
    }
    xml.push_str(r#"<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#);
    for n in 1..=slide_count {
        let _ = write!(
            xml,
            r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
            n
        );
    }
    xml.push_str("</Types>");
    xml
}

/// `_rels/.rels`
pub fn root_rels() -> String {
    format!(
        r#"{}<Relationships xmlns="{}"><Relationship Id="rId1" Type="{}" Target="ppt/presentation.xml"/></Relationships>"#,
        XML_DECLARATION, NS_PACKAGE_RELATIONSHIPS, REL_OFFICE_DOCUMENT
    )
}

pub fn pres_props() -> String {
    format!("{}/>", root_open("presentationPr"))
}

/// `ppt/slideMasters/slideMaster1.xml`
pub fn slide_master() -> String {
    let mut xml = root_open("sldMaster");
    xml.push('>');
    xml.push_str("<p:cSld>");
    xml.push_str(r#"<p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>"#);
    xml.push_str(EMPTY_SHAPE_TREE);
    xml.push_str("</p:cSld>");
    xml.push_str(r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#);
    xml.push_str("<p:sldLayoutIdLst>");
    xml.push_str(r#"<p:sldLayoutId id="2147483649" r:id="rId1"/>"#);
    xml.push_str(r#"<p:sldLayoutId id="2147483650" r:id="rId2"/>"#);
    xml.push_str("</p:sldLayoutIdLst>");
    xml.push_str("</p:sldMaster>");
    xml
}

/// `ppt/slideMasters/_rels/slideMaster1.xml.rels`
pub fn slide_master_rels() -> String {
    format!(
        r#"{}<Relationships xmlns="{}"><Relationship Id="rId1" Type="{}" Target="../slideLayouts/{}"/><Relationship Id="rId2" Type="{}" Target="../slideLayouts/{}"/><Relationship Id="rId3" Type="{}" Target="../theme/theme1.xml"/></Relationships>"#,
        XML_DECLARATION,
        NS_PACKAGE_RELATIONSHIPS,
        REL_SLIDE_LAYOUT,
        TITLE_LAYOUT,
        REL_SLIDE_LAYOUT,
        BLANK_LAYOUT,
        REL_THEME
    )
}

/// Title layout with the title and subtitle placeholders.
pub fn title_layout() -> String {
    let mut xml = root_open("sldLayout");
    xml.push_str(r#" type="title" preserve="1">"#);
    xml.push_str(r#"<p:cSld name="Title Slide"><p:spTree>"#);
    xml.push_str(GROUP_PROPERTIES);
    xml.push_str(r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="ctrTitle"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp>"#);
    xml.push_str(r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Subtitle 2"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="subTitle" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp>"#);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str(r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>"#);
    xml.push_str("</p:sldLayout>");
    xml
}

/// Blank layout for text slides.
pub fn blank_layout() -> String {
    let mut xml = root_open("sldLayout");
    xml.push_str(r#" type="blank" preserve="1">"#);
    xml.push_str(r#"<p:cSld name="Blank">"#);
    xml.push_str(EMPTY_SHAPE_TREE);
    xml.push_str("</p:cSld>");
    xml.push_str(r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>"#);
    xml.push_str("</p:sldLayout>");
    xml
}

/// Relationship from a layout back to the master.
pub fn layout_rels() -> String {
    format!(
        r#"{}<Relationships xmlns="{}"><Relationship Id="rId1" Type="{}" Target="../slideMasters/slideMaster1.xml"/></Relationships>"#,
        XML_DECLARATION, NS_PACKAGE_RELATIONSHIPS, REL_SLIDE_MASTER
    )
}

/// `ppt/theme/theme1.xml`
pub fn theme() -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECLARATION);
    let _ = write!(xml, r#"<a:theme xmlns:a="{}" name="Lyrics">"#, NS_DRAWING);
    xml.push_str("<a:themeElements>");

    xml.push_str(r#"<a:clrScheme name="Lyrics">"#);
    xml.push_str(r#"<a:dk1><a:srgbClr val="000000"/></a:dk1><a:lt1><a:srgbClr val="FFFFFF"/></a:lt1>"#);
    xml.push_str(r#"<a:dk2><a:srgbClr val="44546A"/></a:dk2><a:lt2><a:srgbClr val="E7E6E6"/></a:lt2>"#);
    for (name, rgb) in [
        ("accent1", "4472C4"),
        ("accent2", "ED7D31"),
        ("accent3", "A5A5A5"),
        ("accent4", "FFC000"),
        ("accent5", "5B9BD5"),
        ("accent6", "70AD47"),
        ("hlink", "0563C1"),
        ("folHlink", "954F72"),
    ] {
        let _ = write!(xml, r#"<a:{0}><a:srgbClr val="{1}"/></a:{0}>"#, name, rgb);
    }
    xml.push_str("</a:clrScheme>");

    xml.push_str(r#"<a:fontScheme name="Lyrics">"#);
    for group in ["majorFont", "minorFont"] {
        let _ = write!(
            xml,
            r#"<a:{0}><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:{0}>"#,
            group
        );
    }
    xml.push_str("</a:fontScheme>");

    xml.push_str(r#"<a:fmtScheme name="Lyrics">"#);
    xml.push_str("<a:fillStyleLst>");
    for _ in 0..3 {
        xml.push_str(r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#);
    }
    xml.push_str("</a:fillStyleLst>");
    xml.push_str("<a:lnStyleLst>");
    for width in [6350, 12700, 19050] {
        let _ = write!(
            xml,
            r#"<a:ln w="{}"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
            width
        );
    }
    xml.push_str("</a:lnStyleLst>");
    xml.push_str("<a:effectStyleLst>");
    for _ in 0..3 {
        xml.push_str("<a:effectStyle><a:effectLst/></a:effectStyle>");
    }
    xml.push_str("</a:effectStyleLst>");
    xml.push_str("<a:bgFillStyleLst>");
    for _ in 0..3 {
        xml.push_str(r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#);
    }
    xml.push_str("</a:bgFillStyleLst>");
    xml.push_str("</a:fmtScheme>");

    xml.push_str("</a:themeElements>");
    xml.push_str("</a:theme>");
    xml
}

/// Non-visual properties of the root group shape of every shape tree.
pub const GROUP_PROPERTIES: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

const EMPTY_SHAPE_TREE: &str = r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types_deduplicate_media() {
        let xml = content_types(2, &[ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Png]);
        assert_eq!(xml.matches(r#"Extension="png""#).count(), 1);
        assert!(xml.contains(r#"Extension="jpeg" ContentType="image/jpeg""#));
        assert!(xml.contains("/ppt/slides/slide2.xml"));
        assert!(!xml.contains("/ppt/slides/slide3.xml"));
    }

    #[test]
    fn test_layouts_reference_placeholders() {
        let layout = title_layout();
        assert!(layout.contains(r#"<p:ph type="ctrTitle"/>"#));
        assert!(layout.contains(r#"<p:ph type="subTitle" idx="1"/>"#));
        assert!(blank_layout().contains(r#"type="blank""#));
    }
}
