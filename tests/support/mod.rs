//! Shared test helpers: an in-process completion provider and PDF builders.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

use learnsmart::config::GenerationSettings;
use learnsmart::error::UpstreamError;
use learnsmart::models::ChatCompletionRequest;
use learnsmart::services::{CompletionClient, SummaryService};

/// Records every request and answers with a canned reply.
pub struct FakeCompletionClient {
    requests: Mutex<Vec<ChatCompletionRequest>>,
    reply: Option<String>,
}

impl FakeCompletionClient {
    pub fn replying(summary: &str) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            reply: Some(summary.to_string()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            reply: None,
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ChatCompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionClient for FakeCompletionClient {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<String, UpstreamError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Some(summary) => Ok(summary.clone()),
            None => Err(UpstreamError::Status {
                status: 429,
                body: "rate limited".to_string(),
            }),
        }
    }
}

pub fn service_with(client: Arc<FakeCompletionClient>) -> SummaryService {
    SummaryService::new(client, GenerationSettings::default())
}

/// A page is its content operations plus the named resources it draws with.
pub struct PageSpec {
    pub operations: Vec<Operation>,
    pub xobjects: Vec<(&'static str, Stream)>,
    pub fonts: Vec<(&'static str, Dictionary)>,
    pub media_box: Option<[i64; 4]>,
}

impl PageSpec {
    pub fn text(items: &[&str]) -> Self {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
        ];
        for item in items {
            operations.push(Operation::new("Tj", vec![Object::string_literal(*item)]));
        }
        operations.push(Operation::new("ET", vec![]));
        Self::raw(operations)
    }

    pub fn raw(operations: Vec<Operation>) -> Self {
        Self {
            operations,
            xobjects: Vec::new(),
            fonts: Vec::new(),
            media_box: None,
        }
    }

    pub fn with_xobject(mut self, name: &'static str, stream: Stream) -> Self {
        self.xobjects.push((name, stream));
        self
    }

    pub fn with_font(mut self, name: &'static str, font: Dictionary) -> Self {
        self.fonts.push((name, font));
        self
    }

    /// Overrides the inherited A4 MediaBox on this page.
    pub fn with_media_box(mut self, media_box: [i64; 4]) -> Self {
        self.media_box = Some(media_box);
        self
    }
}

/// A Type1 Helvetica font declaring the given simple encoding.
pub fn encoded_font(encoding: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => Object::Name(encoding.as_bytes().to_vec()),
    }
}

/// A form XObject whose content is the given operations.
pub fn form_xobject(operations: Vec<Operation>) -> Stream {
    let content = Content { operations };
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        },
        content.encode().unwrap(),
    )
}

/// Builds an A4 PDF (595x842, MediaBox inherited from the page tree).
pub fn build_pdf(pages: Vec<PageSpec>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for page in pages {
        let content = Content {
            operations: page.operations,
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let mut fonts = dictionary! { "F1" => font_id };
        for (name, font) in page.fonts {
            fonts.set(name, doc.add_object(font));
        }
        let mut resources = dictionary! { "Font" => fonts };
        if !page.xobjects.is_empty() {
            let mut xobjects = Dictionary::new();
            for (name, stream) in page.xobjects {
                xobjects.set(name, doc.add_object(stream));
            }
            resources.set("XObject", xobjects);
        }

        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources,
        };
        if let Some(media_box) = page.media_box {
            let values: Vec<Object> = media_box.iter().map(|v| Object::Integer(*v)).collect();
            page_dict.set("MediaBox", values);
        }
        let page_id = doc.add_object(page_dict);
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let page_tree = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(page_tree));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

pub fn text_pdf(pages: &[&[&str]]) -> Vec<u8> {
    build_pdf(pages.iter().map(|items| PageSpec::text(items)).collect())
}

/// A 16x16 solid red JPEG image XObject.
pub fn red_jpeg() -> Stream {
    let mut jpeg = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([255, 0, 0])))
        .write_to(&mut Cursor::new(&mut jpeg), ImageOutputFormat::Jpeg(95))
        .unwrap();

    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 16,
            "Height" => 16,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    )
}

/// One page with a solid red JPEG drawn at (50, 50) sized 200x100.
pub fn image_pdf() -> Vec<u8> {
    let operations = vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![200.into(), 0.into(), 0.into(), 100.into(), 50.into(), 50.into()],
        ),
        Operation::new("Do", vec!["Im1".into()]),
        Operation::new("Q", vec![]),
    ];

    build_pdf(vec![PageSpec::raw(operations).with_xobject("Im1", red_jpeg())])
}
