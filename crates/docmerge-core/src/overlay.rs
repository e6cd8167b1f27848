//! Draw text and images on top of existing PDF pages
//!
//! Drawing operations are buffered per page and written out in one pass by
//! [`PageOverlay::finish`]. The original page content is wrapped in a `q`/`Q`
//! pair so graphics state it leaves behind cannot move or recolor the overlay.

use crate::error::MergeError;
use crate::signature::SignatureImage;
use flate2::{write::ZlibEncoder, Compression};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::BTreeMap;
use std::io::Write;

/// US Letter, used when no MediaBox is found anywhere in the page tree
const DEFAULT_PAGE_SIZE: (f64, f64) = (612.0, 792.0);

const FONT_RESOURCE_PREFIX: &str = "DmHelv";
const IMAGE_RESOURCE_PREFIX: &str = "DmSig";

/// Escape text for a PDF literal string in WinAnsi encoding
///
/// Characters outside WinAnsi become `?`.
fn escape_pdf_string(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '(' => out.extend_from_slice(b"\\("),
            ')' => out.extend_from_slice(b"\\)"),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\n' | '\r' | '\t' => out.push(b' '),
            _ if c.is_ascii() && !c.is_ascii_control() => out.push(c as u8),
            _ => match winansi_byte(c) {
                Some(b) => out.extend_from_slice(format!("\\{:03o}", b).as_bytes()),
                None => out.push(b'?'),
            },
        }
    }
    out
}

/// WinAnsi code for a non-ASCII character, if it has one
fn winansi_byte(c: char) -> Option<u8> {
    let code = c as u32;
    if (0xA0..=0xFF).contains(&code) {
        return Some(code as u8);
    }
    let b = match c {
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(b)
}

/// Format a coordinate for a content stream (no exponent, trimmed zeros)
fn fmt_num(v: f64) -> String {
    let s = format!("{:.4}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" || s.is_empty() {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Resolve a direct or referenced dictionary into an owned copy
fn resolve_dict(doc: &Document, obj: &Object) -> Option<Dictionary> {
    match obj {
        Object::Dictionary(d) => Some(d.clone()),
        Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok().cloned(),
        _ => None,
    }
}

/// Look up a page attribute, following `Parent` links for inherited keys
fn inherited_attribute<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = Some(page_id);
    // Bounded walk guards against Parent cycles in damaged files
    for _ in 0..64 {
        let id = current?;
        let dict = doc.get_object(id).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok();
    }
    None
}

/// Page width and height from its (possibly inherited) MediaBox
pub fn page_size(doc: &Document, page_id: ObjectId) -> (f64, f64) {
    let media_box = inherited_attribute(doc, page_id, b"MediaBox").and_then(|obj| match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    });
    let values: Option<Vec<f64>> = media_box
        .and_then(|obj| obj.as_array().ok())
        .filter(|arr| arr.len() == 4)
        .and_then(|arr| arr.iter().map(number).collect());

    match values.as_deref() {
        Some([x1, y1, x2, y2]) => ((x2 - x1).abs(), (y2 - y1).abs()),
        _ => DEFAULT_PAGE_SIZE,
    }
}

fn unique_name(existing: &Dictionary, prefix: &str) -> String {
    let mut n = 1;
    loop {
        let candidate = format!("{}{}", prefix, n);
        if !existing.has(candidate.as_bytes()) {
            return candidate;
        }
        n += 1;
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, MergeError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| MergeError::OperationError(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| MergeError::OperationError(e.to_string()))
}

/// Pending drawing for one page
struct PendingPage {
    resources: Dictionary,
    content: Vec<u8>,
    font_name: Option<String>,
}

impl PendingPage {
    fn new(doc: &Document, page_id: ObjectId) -> Self {
        let resources = inherited_attribute(doc, page_id, b"Resources")
            .and_then(|obj| resolve_dict(doc, obj))
            .unwrap_or_default();
        Self {
            resources,
            content: Vec::new(),
            font_name: None,
        }
    }
}

/// A loaded PDF that accepts drawing operations addressed by zero-based
/// page index
pub struct PageOverlay {
    doc: Document,
    pages: Vec<ObjectId>,
    font_id: Option<ObjectId>,
    pending: BTreeMap<ObjectId, PendingPage>,
}

impl PageOverlay {
    /// Parse PDF bytes; the input slice is never modified
    pub fn load(pdf_bytes: &[u8]) -> Result<Self, MergeError> {
        let doc =
            Document::load_mem(pdf_bytes).map_err(|e| MergeError::ParseError(e.to_string()))?;
        // get_pages is keyed by 1-based page number in document order
        let pages = doc.get_pages().into_values().collect();
        Ok(Self {
            doc,
            pages,
            font_id: None,
            pending: BTreeMap::new(),
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Height of the page at `index`, or `None` when out of range
    pub fn page_height(&self, index: usize) -> Option<f64> {
        let page_id = *self.pages.get(index)?;
        Some(page_size(&self.doc, page_id).1)
    }

    fn page_id(&self, index: usize) -> Result<ObjectId, MergeError> {
        self.pages
            .get(index)
            .copied()
            .ok_or_else(|| MergeError::OperationError(format!("Page index {} not found", index)))
    }

    fn register_resource(
        doc: &Document,
        page: &mut PendingPage,
        category: &[u8],
        prefix: &str,
        target: ObjectId,
    ) -> String {
        let mut entries = page
            .resources
            .get(category)
            .ok()
            .and_then(|obj| resolve_dict(doc, obj))
            .unwrap_or_default();
        let name = unique_name(&entries, prefix);
        entries.set(name.as_bytes().to_vec(), Object::Reference(target));
        page.resources
            .set(category.to_vec(), Object::Dictionary(entries));
        name
    }

    fn helvetica(&mut self) -> ObjectId {
        match self.font_id {
            Some(id) => id,
            None => {
                let id = self.doc.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => "Helvetica",
                    "Encoding" => "WinAnsiEncoding",
                });
                self.font_id = Some(id);
                id
            }
        }
    }

    /// Draw one line of black Helvetica text with its baseline at `(x, y)`
    pub fn draw_text(
        &mut self,
        index: usize,
        x: f64,
        y: f64,
        font_size: f64,
        text: &str,
    ) -> Result<(), MergeError> {
        let font_id = self.helvetica();
        let page_id = self.page_id(index)?;
        let doc = &self.doc;
        let page = self
            .pending
            .entry(page_id)
            .or_insert_with(|| PendingPage::new(doc, page_id));

        let font_name = match &page.font_name {
            Some(name) => name.clone(),
            None => {
                let name =
                    Self::register_resource(doc, page, b"Font", FONT_RESOURCE_PREFIX, font_id);
                page.font_name = Some(name.clone());
                name
            }
        };

        let ops = &mut page.content;
        ops.extend_from_slice(
            format!(
                "BT\n/{} {} Tf\n0 0 0 rg\n{} {} Td\n(",
                font_name,
                fmt_num(font_size),
                fmt_num(x),
                fmt_num(y)
            )
            .as_bytes(),
        );
        ops.extend_from_slice(&escape_pdf_string(text));
        ops.extend_from_slice(b") Tj\nET\n");
        Ok(())
    }

    /// Embed `image` and draw it scaled to `width` x `height` with its
    /// lower-left corner at `(x, y)`
    pub fn draw_image(
        &mut self,
        index: usize,
        image: &SignatureImage,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), MergeError> {
        let page_id = self.page_id(index)?;
        let image_id = self.embed_image(image)?;
        let doc = &self.doc;
        let page = self
            .pending
            .entry(page_id)
            .or_insert_with(|| PendingPage::new(doc, page_id));

        let name =
            Self::register_resource(doc, page, b"XObject", IMAGE_RESOURCE_PREFIX, image_id);
        page.content.extend_from_slice(
            format!(
                "q\n{} 0 0 {} {} {} cm\n/{} Do\nQ\n",
                fmt_num(width),
                fmt_num(height),
                fmt_num(x),
                fmt_num(y),
                name
            )
            .as_bytes(),
        );
        Ok(())
    }

    fn embed_image(&mut self, image: &SignatureImage) -> Result<ObjectId, MergeError> {
        let smask_id = match &image.alpha {
            Some(alpha) => {
                let stream = Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => image.width as i64,
                        "Height" => image.height as i64,
                        "ColorSpace" => "DeviceGray",
                        "BitsPerComponent" => 8,
                        "Filter" => "FlateDecode",
                    },
                    deflate(alpha)?,
                );
                Some(self.doc.add_object(stream))
            }
            None => None,
        };

        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width as i64,
            "Height" => image.height as i64,
            "ColorSpace" => image.color_space.pdf_name(),
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        if let Some(id) = smask_id {
            dict.set("SMask", Object::Reference(id));
        }

        let stream = Stream::new(dict, deflate(&image.color)?);
        Ok(self.doc.add_object(stream))
    }

    /// Write buffered drawing into the pages and serialize the document
    pub fn finish(mut self) -> Result<Vec<u8>, MergeError> {
        let pending = std::mem::take(&mut self.pending);
        for (page_id, page) in pending {
            self.install(page_id, page)?;
        }

        let mut output = Vec::new();
        self.doc
            .save_to(&mut output)
            .map_err(|e| MergeError::SaveError(e.to_string()))?;
        Ok(output)
    }

    fn install(&mut self, page_id: ObjectId, page: PendingPage) -> Result<(), MergeError> {
        let existing = {
            let dict = self
                .doc
                .get_object(page_id)
                .and_then(|o| o.as_dict())
                .map_err(|e| MergeError::OperationError(e.to_string()))?;
            match dict.get(b"Contents") {
                Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                    Ok(Object::Array(arr)) => arr.clone(),
                    _ => vec![Object::Reference(*id)],
                },
                Ok(Object::Array(arr)) => arr.clone(),
                _ => Vec::new(),
            }
        };

        let mut overlay = b"\nQ\n".to_vec();
        overlay.extend_from_slice(&page.content);

        let open_id = self.doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
        let overlay_id = self.doc.add_object(Stream::new(dictionary! {}, overlay));

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(open_id));
        contents.extend(existing);
        contents.push(Object::Reference(overlay_id));

        let dict = self
            .doc
            .get_object_mut(page_id)
            .and_then(|o| o.as_dict_mut())
            .map_err(|e| MergeError::OperationError(e.to_string()))?;
        dict.set("Contents", Object::Array(contents));
        dict.set("Resources", Object::Dictionary(page.resources));
        Ok(())
    }
}
