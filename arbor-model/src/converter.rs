use crate::property::TagStorage;
use arbor_types::NodeKey;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

/// Tag behaviour declared by a converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSupport {
    /// Delimiter used when the data type does not configure one. `None`
    /// leaves the choice to the host's default.
    pub delimiter: Option<char>,
    pub storage: TagStorage,
}

/// A file submitted together with a save request, already sitting in the
/// upload temp directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionFile {
    pub property_alias: String,
    pub culture: Option<String>,
    /// Sanitised file name.
    pub file_name: String,
    pub temp_path: PathBuf,
}

/// Everything a converter sees about one submitted field.
#[derive(Debug, Clone)]
pub struct ConversionInput {
    pub value: Value,
    /// The data type's stored configuration.
    pub configuration: Value,
    pub content_key: NodeKey,
    pub property_type_key: NodeKey,
    pub files: Vec<ConversionFile>,
}

/// Converts editor-submitted values into their stored representation.
///
/// Only `editor_alias` and `from_editor` are required.
pub trait ValueConverter: Send + Sync {
    /// Alias data types use to select this converter.
    fn editor_alias(&self) -> &str;

    /// Read-only converters are never written by the mapping pipeline.
    fn is_read_only(&self) -> bool {
        false
    }

    /// Returns tag behaviour if this converter stores tags.
    fn tag_support(&self) -> Option<TagSupport> {
        None
    }

    /// Converts `input.value`. `previous` is the value currently stored.
    /// Return `Err(message)` to reject the field.
    fn from_editor(
        &self,
        input: &ConversionInput,
        previous: Option<&Value>,
    ) -> Result<Value, String>;
}

/// Editor alias → converter lookup.
///
/// Registration may race with lookups from running requests; lookups
/// always see a complete snapshot.
pub struct ValueConverterRegistry {
    converters: RwLock<HashMap<String, Arc<dyn ValueConverter>>>,
}

impl ValueConverterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            converters: RwLock::new(HashMap::new()),
        }
    }

    /// A registry holding the built-in converters.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(TextConverter::text_box()));
        registry.register(Arc::new(TextConverter::text_area()));
        registry.register(Arc::new(IntegerConverter));
        registry.register(Arc::new(TrueFalseConverter));
        registry.register(Arc::new(TagsConverter));
        registry.register(Arc::new(UploadFieldConverter));
        registry.register(Arc::new(LabelConverter));
        registry
    }

    /// Adds or replaces the converter for its editor alias.
    pub fn register(&self, converter: Arc<dyn ValueConverter>) {
        let mut map = self.converters.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(converter.editor_alias().to_string(), converter);
    }

    pub fn unregister(&self, editor_alias: &str) -> bool {
        let mut map = self.converters.write().unwrap_or_else(PoisonError::into_inner);
        map.remove(editor_alias).is_some()
    }

    pub fn get(&self, editor_alias: &str) -> Option<Arc<dyn ValueConverter>> {
        let map = self.converters.read().unwrap_or_else(PoisonError::into_inner);
        map.get(editor_alias).cloned()
    }

    pub fn len(&self) -> usize {
        self.converters.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ValueConverterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// ── Built-in converters ─────────────────────────────────────────

pub const TEXT_BOX: &str = "Arbor.TextBox";
pub const TEXT_AREA: &str = "Arbor.TextArea";
pub const INTEGER: &str = "Arbor.Integer";
pub const TRUE_FALSE: &str = "Arbor.TrueFalse";
pub const TAGS: &str = "Arbor.Tags";
pub const UPLOAD_FIELD: &str = "Arbor.UploadField";
pub const LABEL: &str = "Arbor.Label";

/// Plain text. Honours an optional `maxChars` configuration.
pub struct TextConverter {
    alias: &'static str,
}

impl TextConverter {
    pub fn text_box() -> Self {
        Self { alias: TEXT_BOX }
    }

    pub fn text_area() -> Self {
        Self { alias: TEXT_AREA }
    }
}

impl ValueConverter for TextConverter {
    fn editor_alias(&self) -> &str {
        self.alias
    }

    fn from_editor(
        &self,
        input: &ConversionInput,
        _previous: Option<&Value>,
    ) -> Result<Value, String> {
        let text = match &input.value {
            Value::Null => return Ok(Value::Null),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        if let Some(max) = input.configuration.get("maxChars").and_then(Value::as_u64) {
            let len = text.chars().count() as u64;
            if len > max {
                return Err(format!("value exceeds {max} characters ({len})"));
            }
        }
        Ok(Value::String(text))
    }
}

pub struct IntegerConverter;

impl ValueConverter for IntegerConverter {
    fn editor_alias(&self) -> &str {
        INTEGER
    }

    fn from_editor(
        &self,
        input: &ConversionInput,
        _previous: Option<&Value>,
    ) -> Result<Value, String> {
        match &input.value {
            Value::Null => Ok(Value::Null),
            Value::Number(n) if n.is_i64() => Ok(Value::Number(n.clone())),
            Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| format!("'{s}' is not a valid integer")),
            other => Err(format!("{other} is not a valid integer")),
        }
    }
}

/// Stores booleans. Accepts `true`/`false`, `1`/`0` and their string forms.
pub struct TrueFalseConverter;

impl ValueConverter for TrueFalseConverter {
    fn editor_alias(&self) -> &str {
        TRUE_FALSE
    }

    fn from_editor(
        &self,
        input: &ConversionInput,
        _previous: Option<&Value>,
    ) -> Result<Value, String> {
        let flag = match &input.value {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_i64() == Some(1),
            Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true"),
            other => return Err(format!("{other} is not a boolean")),
        };
        Ok(Value::Bool(flag))
    }
}

/// Passes tags through; the tag-aware property setter does the storing.
pub struct TagsConverter;

impl ValueConverter for TagsConverter {
    fn editor_alias(&self) -> &str {
        TAGS
    }

    fn tag_support(&self) -> Option<TagSupport> {
        Some(TagSupport {
            delimiter: Some(','),
            storage: TagStorage::Csv,
        })
    }

    fn from_editor(
        &self,
        input: &ConversionInput,
        _previous: Option<&Value>,
    ) -> Result<Value, String> {
        Ok(input.value.clone())
    }
}

/// Single-file upload.
///
/// With a matching file the stored value becomes the file's media path.
/// Without one, a cleared value removes the file and anything else keeps
/// the previous path.
pub struct UploadFieldConverter;

impl UploadFieldConverter {
    /// Media path a file is stored under for a given content/property pair.
    pub fn media_path(content_key: NodeKey, property_type_key: NodeKey, file_name: &str) -> String {
        let content = content_key.as_uuid().simple().to_string();
        let property = property_type_key.as_uuid().simple().to_string();
        format!("/media/{}{}/{}", &content[..8], &property[..4], file_name)
    }
}

impl ValueConverter for UploadFieldConverter {
    fn editor_alias(&self) -> &str {
        UPLOAD_FIELD
    }

    fn from_editor(
        &self,
        input: &ConversionInput,
        previous: Option<&Value>,
    ) -> Result<Value, String> {
        if let Some(file) = input.files.first() {
            return Ok(Value::String(Self::media_path(
                input.content_key,
                input.property_type_key,
                &file.file_name,
            )));
        }
        match &input.value {
            Value::Null => Ok(Value::Null),
            Value::String(s) if s.is_empty() => Ok(Value::Null),
            _ => Ok(previous.cloned().unwrap_or(Value::Null)),
        }
    }
}

/// Display-only value; never written from the editor.
pub struct LabelConverter;

impl ValueConverter for LabelConverter {
    fn editor_alias(&self) -> &str {
        LABEL
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn from_editor(
        &self,
        _input: &ConversionInput,
        previous: Option<&Value>,
    ) -> Result<Value, String> {
        Ok(previous.cloned().unwrap_or(Value::Null))
    }
}
