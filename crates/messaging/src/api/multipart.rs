//! `multipart/form-data` encoding for the send-message endpoint

use uuid::Uuid;

/// One field of a multipart form
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: String,
    /// Present for file fields
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Part {
    /// The field value as UTF-8 text, if it is valid UTF-8
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }
}

/// A multipart form body
#[derive(Debug, Clone)]
pub struct Multipart {
    boundary: String,
    parts: Vec<Part>,
}

impl Default for Multipart {
    fn default() -> Self {
        Self::new()
    }
}

impl Multipart {
    pub fn new() -> Self {
        Self {
            boundary: format!("hirechat-{}", Uuid::new_v4().simple()),
            parts: Vec::new(),
        }
    }

    /// Add a plain text field
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part {
            name: name.into(),
            file_name: None,
            content_type: None,
            data: value.into().into_bytes(),
        });
        self
    }

    /// Add a file field. The part content type is guessed from the file name.
    pub fn file(mut self, name: impl Into<String>, file_name: impl Into<String>, data: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        self.parts.push(Part {
            name: name.into(),
            file_name: Some(file_name),
            content_type: Some(content_type),
            data,
        });
        self
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name == name)
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request's `Content-Type` header
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Serialize the form into a request body
    pub fn encode(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for part in &self.parts {
            body.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            let mut disposition = format!(
                "Content-Disposition: form-data; name=\"{}\"",
                escape_quoted(&part.name)
            );
            if let Some(file_name) = &part.file_name {
                disposition.push_str(&format!("; filename=\"{}\"", escape_quoted(file_name)));
            }
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(b"\r\n");
            if let Some(content_type) = &part.content_type {
                body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(&part.data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        body
    }
}

/// Escape a value for use inside a quoted header parameter
fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded_string(form: &Multipart) -> String {
        String::from_utf8(form.encode()).unwrap()
    }

    #[test]
    fn test_text_only() {
        let form = Multipart::new().text("content", "hello");
        let body = encoded_string(&form);
        let boundary = form.boundary();

        assert!(body.starts_with(&format!("--{}\r\n", boundary)));
        assert!(body.contains("Content-Disposition: form-data; name=\"content\"\r\n\r\nhello\r\n"));
        assert!(body.ends_with(&format!("--{}--\r\n", boundary)));
        assert!(form.field("file").is_none());
    }

    #[test]
    fn test_file_part_has_filename_and_type() {
        let form = Multipart::new().file("file", "report.pdf", b"%PDF".to_vec());
        let body = encoded_string(&form);

        assert!(body.contains("name=\"file\"; filename=\"report.pdf\"\r\n"));
        assert!(body.contains("Content-Type: application/pdf\r\n\r\n%PDF\r\n"));
    }

    #[test]
    fn test_unknown_extension_is_octet_stream() {
        let form = Multipart::new().file("file", "blob.unknownext", vec![1, 2, 3]);
        assert_eq!(
            form.field("file").unwrap().content_type.as_deref(),
            Some("application/octet-stream")
        );
    }

    #[test]
    fn test_both_fields_in_order() {
        let form = Multipart::new()
            .text("content", "see attached")
            .file("file", "notes.txt", b"n".to_vec());
        let names: Vec<&str> = form.parts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["content", "file"]);
        assert_eq!(form.field("content").unwrap().text(), Some("see attached"));
    }

    #[test]
    fn test_filename_quotes_are_escaped() {
        let form = Multipart::new().file("file", "a\"b.txt", vec![]);
        assert!(encoded_string(&form).contains("filename=\"a%22b.txt\""));
    }

    #[test]
    fn test_content_type_header() {
        let form = Multipart::new();
        assert_eq!(
            form.content_type(),
            format!("multipart/form-data; boundary={}", form.boundary())
        );
    }
}
