//! PPT Report Generator Module
//! Packs exported chart PNGs into a PowerPoint deck: a title slide followed by
//! one slide per chart.
//!
//! The OOXML parts are written by hand into a ZIP archive.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use zip::write::FileOptions;
use zip::ZipWriter;

#[derive(Error, Debug)]
pub enum PptError {
    #[error("Failed to write presentation: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to write presentation archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// One chart slide: heading text and PNG bytes.
#[derive(Debug, Clone)]
pub struct ChartSlide {
    pub title: String,
    pub png: Vec<u8>,
}

/// EMU (English Metric Units): 914400 EMU = 1 inch
const EMU_PER_INCH: i64 = 914400;
/// 16:9 slide, 13.333 x 7.5 inches
const SLIDE_WIDTH: i64 = 12192000;
const SLIDE_HEIGHT: i64 = 6858000;
const TITLE_HEIGHT: i64 = EMU_PER_INCH * 3 / 4;

const SLIDE_NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const GROUP_HEADER: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

pub struct PptGenerator;

impl PptGenerator {
    /// Write `deck_title` as slide 1 and each chart on its own slide after it.
    pub fn generate(
        charts: &[ChartSlide],
        output_path: &Path,
        deck_title: &str,
        subtitle: &str,
    ) -> Result<(), PptError> {
        let file = File::create(output_path)?;
        let mut zip = ZipWriter::new(file);
        let options = FileOptions::default();
        let slide_count = charts.len() + 1;

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(Self::content_types_xml(slide_count).as_bytes())?;
        zip.start_file("_rels/.rels", options)?;
        zip.write_all(Self::package_rels_xml().as_bytes())?;
        zip.start_file("ppt/_rels/presentation.xml.rels", options)?;
        zip.write_all(Self::presentation_rels_xml(slide_count).as_bytes())?;
        zip.start_file("ppt/presentation.xml", options)?;
        zip.write_all(Self::presentation_xml(slide_count).as_bytes())?;

        zip.start_file("ppt/slides/_rels/slide1.xml.rels", options)?;
        zip.write_all(Self::slide_rels_xml(None).as_bytes())?;
        zip.start_file("ppt/slides/slide1.xml", options)?;
        zip.write_all(Self::title_slide_xml(deck_title, subtitle).as_bytes())?;

        for (idx, chart) in charts.iter().enumerate() {
            let slide_num = idx + 2;
            let image_num = idx + 1;

            zip.start_file(
                format!("ppt/slides/_rels/slide{}.xml.rels", slide_num),
                options,
            )?;
            zip.write_all(Self::slide_rels_xml(Some(image_num)).as_bytes())?;
            zip.start_file(format!("ppt/slides/slide{}.xml", slide_num), options)?;
            zip.write_all(Self::chart_slide_xml(&chart.title).as_bytes())?;
            zip.start_file(format!("ppt/media/image{}.png", image_num), options)?;
            zip.write_all(&chart.png)?;
        }

        zip.start_file("ppt/slideLayouts/slideLayout1.xml", options)?;
        zip.write_all(Self::slide_layout_xml().as_bytes())?;
        zip.start_file("ppt/slideLayouts/_rels/slideLayout1.xml.rels", options)?;
        zip.write_all(Self::single_rel_xml("slideMaster", "../slideMasters/slideMaster1.xml").as_bytes())?;
        zip.start_file("ppt/slideMasters/slideMaster1.xml", options)?;
        zip.write_all(Self::slide_master_xml().as_bytes())?;
        zip.start_file("ppt/slideMasters/_rels/slideMaster1.xml.rels", options)?;
        zip.write_all(Self::master_rels_xml().as_bytes())?;
        zip.start_file("ppt/theme/theme1.xml", options)?;
        zip.write_all(Self::theme_xml().as_bytes())?;
        zip.start_file("docProps/core.xml", options)?;
        zip.write_all(Self::core_props_xml(deck_title).as_bytes())?;
        zip.start_file("docProps/app.xml", options)?;
        zip.write_all(Self::app_props_xml(slide_count).as_bytes())?;

        zip.finish()?;

        info!(
            path = %output_path.display(),
            slides = slide_count,
            "Presentation written"
        );
        Ok(())
    }

    fn content_types_xml(slide_count: usize) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Default Extension="png" ContentType="image/png"/>
<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>
<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>
<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
"#,
        );
        for i in 1..=slide_count {
            xml.push_str(&format!(
                r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
                i
            ));
            xml.push('\n');
        }
        xml.push_str("</Types>");
        xml
    }

    fn package_rels_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#
    }

    fn relationships(entries: &[(usize, &str, String)]) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
"#,
        );
        for (id, kind, target) in entries {
            xml.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{}/{}" Target="{}"/>"#,
                id, REL_NS, kind, target
            ));
            xml.push('\n');
        }
        xml.push_str("</Relationships>");
        xml
    }

    fn single_rel_xml(kind: &str, target: &str) -> String {
        Self::relationships(&[(1, kind, target.to_string())])
    }

    fn presentation_rels_xml(slide_count: usize) -> String {
        let mut entries = vec![
            (1, "slideMaster", "slideMasters/slideMaster1.xml".to_string()),
            (2, "theme", "theme/theme1.xml".to_string()),
        ];
        entries.extend((1..=slide_count).map(|i| (i + 2, "slide", format!("slides/slide{}.xml", i))));
        Self::relationships(&entries)
    }

    fn master_rels_xml() -> String {
        Self::relationships(&[
            (1, "slideLayout", "../slideLayouts/slideLayout1.xml".to_string()),
            (2, "theme", "../theme/theme1.xml".to_string()),
        ])
    }

    /// Slide relationships; chart slides embed their image as rId2.
    fn slide_rels_xml(image_num: Option<usize>) -> String {
        let mut entries = vec![(1, "slideLayout", "../slideLayouts/slideLayout1.xml".to_string())];
        if let Some(num) = image_num {
            entries.push((2, "image", format!("../media/image{}.png", num)));
        }
        Self::relationships(&entries)
    }

    fn presentation_xml(slide_count: usize) -> String {
        let slide_ids: String = (1..=slide_count)
            .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + i, i + 2))
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {} saveSubsetFonts="1">
<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>
<p:sldIdLst>{}</p:sldIdLst>
<p:sldSz cx="{}" cy="{}"/>
<p:notesSz cx="{}" cy="{}"/>
</p:presentation>"#,
            SLIDE_NS, slide_ids, SLIDE_WIDTH, SLIDE_HEIGHT, SLIDE_HEIGHT, SLIDE_WIDTH
        )
    }

    fn text_box(id: usize, text: &str, rect: (i64, i64, i64, i64), size_pt: u32, bold: bool) -> String {
        let (x, y, w, h) = rect;
        format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{w}" cy="{h}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr><p:txBody><a:bodyPr wrap="square" anchor="ctr"/><a:lstStyle/><a:p><a:pPr algn="ctr"/><a:r><a:rPr lang="en-US" sz="{sz}" b="{b}"/><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#,
            id = id,
            x = x,
            y = y,
            w = w,
            h = h,
            sz = size_pt * 100,
            b = u8::from(bold),
            text = escape_xml(text),
        )
    }

    fn slide_xml(shapes: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {}>
<p:cSld><p:spTree>{}{}</p:spTree></p:cSld>
<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sld>"#,
            SLIDE_NS, GROUP_HEADER, shapes
        )
    }

    fn title_slide_xml(title: &str, subtitle: &str) -> String {
        let margin = EMU_PER_INCH;
        let width = SLIDE_WIDTH - 2 * margin;
        let mut shapes = Self::text_box(
            2,
            title,
            (margin, SLIDE_HEIGHT / 2 - EMU_PER_INCH, width, EMU_PER_INCH),
            36,
            true,
        );
        shapes.push_str(&Self::text_box(
            3,
            subtitle,
            (margin, SLIDE_HEIGHT / 2 + EMU_PER_INCH / 4, width, EMU_PER_INCH / 2),
            18,
            false,
        ));
        Self::slide_xml(&shapes)
    }

    /// Title strip on top, picture filling the rest with a half-inch margin.
    fn chart_slide_xml(title: &str) -> String {
        let margin = EMU_PER_INCH / 2;
        let width = SLIDE_WIDTH - 2 * margin;
        let pic_top = margin + TITLE_HEIGHT;
        let pic_height = SLIDE_HEIGHT - pic_top - margin;

        let mut shapes = Self::text_box(2, title, (margin, margin / 2, width, TITLE_HEIGHT), 24, true);
        shapes.push_str(&format!(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="3" name="Chart"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#,
            margin, pic_top, width, pic_height
        ));
        Self::slide_xml(&shapes)
    }

    fn slide_layout_xml() -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout {} type="blank" preserve="1">
<p:cSld name="Blank"><p:spTree>{}</p:spTree></p:cSld>
<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sldLayout>"#,
            SLIDE_NS, GROUP_HEADER
        )
    }

    fn slide_master_xml() -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster {}>
<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>{}</p:spTree></p:cSld>
<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>
<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>
</p:sldMaster>"#,
            SLIDE_NS, GROUP_HEADER
        )
    }

    /// Minimal theme: tab10 accents and plain fill/line/effect styles.
    fn theme_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Dashboard">
<a:themeElements>
<a:clrScheme name="Dashboard"><a:dk1><a:srgbClr val="000000"/></a:dk1><a:lt1><a:srgbClr val="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="333333"/></a:dk2><a:lt2><a:srgbClr val="EEEEEE"/></a:lt2><a:accent1><a:srgbClr val="1F77B4"/></a:accent1><a:accent2><a:srgbClr val="FF7F0E"/></a:accent2><a:accent3><a:srgbClr val="2CA02C"/></a:accent3><a:accent4><a:srgbClr val="D62728"/></a:accent4><a:accent5><a:srgbClr val="9467BD"/></a:accent5><a:accent6><a:srgbClr val="7F7F7F"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme>
<a:fontScheme name="Dashboard"><a:majorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme>
<a:fmtScheme name="Dashboard"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme>
</a:themeElements>
<a:objectDefaults/>
<a:extraClrSchemeLst/>
</a:theme>"#
    }

    fn core_props_xml(title: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<dc:title>{}</dc:title>
<dc:creator>Volatility Dashboard</dc:creator>
<cp:revision>1</cp:revision>
</cp:coreProperties>"#,
            escape_xml(title)
        )
    }

    fn app_props_xml(slide_count: usize) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
<Application>Volatility Dashboard</Application>
<PresentationFormat>Widescreen</PresentationFormat>
<Slides>{}</Slides>
</Properties>"#,
            slide_count
        )
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & 'c'"), "a&lt;b &amp; &apos;c&apos;");
    }

    #[test]
    fn test_generate_deck() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.pptx");
        let charts = vec![
            ChartSlide {
                title: "Composition".to_string(),
                png: vec![1, 2, 3],
            },
            ChartSlide {
                title: "Trend - Product <A&B>".to_string(),
                png: vec![4, 5, 6],
            },
        ];

        PptGenerator::generate(&charts, &path, "Dashboard", "panel_TH_1.csv").unwrap();

        let mut archive = zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
        assert!(archive.by_name("ppt/slides/slide3.xml").is_ok());
        assert!(archive.by_name("ppt/slides/slide4.xml").is_err());

        let mut image = Vec::new();
        archive
            .by_name("ppt/media/image2.png")
            .unwrap()
            .read_to_end(&mut image)
            .unwrap();
        assert_eq!(image, vec![4, 5, 6]);

        let mut slide = String::new();
        archive
            .by_name("ppt/slides/slide3.xml")
            .unwrap()
            .read_to_string(&mut slide)
            .unwrap();
        assert!(slide.contains("Product &lt;A&amp;B&gt;"));
    }
}
