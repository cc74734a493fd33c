//! Object lookups shared by text extraction and the preview renderer.

use lopdf::{Dictionary, Object, ObjectId};

const MAX_INHERITANCE_DEPTH: usize = 32;

pub(crate) fn resolve<'a>(pdf: &'a lopdf::Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => pdf.get_object(*id).unwrap_or(object),
        other => other,
    }
}

pub(crate) fn resolve_dict<'a>(pdf: &'a lopdf::Document, object: &'a Object) -> Option<&'a Dictionary> {
    resolve(pdf, object).as_dict().ok()
}

pub(crate) fn is_name(object: Option<&Object>, expected: &[u8]) -> bool {
    matches!(object, Some(Object::Name(name)) if name.as_slice() == expected)
}

/// Looks up a page attribute, following `Parent` links for inheritable keys.
pub(crate) fn inherited_entry<'a>(
    pdf: &'a lopdf::Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut dict = pdf.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
        dict = pdf.get_dictionary(parent).ok()?;
    }
    None
}

pub(crate) fn page_resources(pdf: &lopdf::Document, page_id: ObjectId) -> Option<&Dictionary> {
    inherited_entry(pdf, page_id, b"Resources").and_then(|resources| resolve_dict(pdf, resources))
}

/// The named entry of a resource category such as `XObject` or `Font`.
pub(crate) fn resource<'a>(
    pdf: &'a lopdf::Document,
    resources: &'a Dictionary,
    category: &[u8],
    name: &[u8],
) -> Option<&'a Object> {
    let entries = resolve_dict(pdf, resources.get(category).ok()?)?;
    entries.get(name).ok().map(|object| resolve(pdf, object))
}
