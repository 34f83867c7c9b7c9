#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Pdf,
    Image,
    Text,
    Other,
}

impl ContentType {
    pub fn from_extension(extension: Option<&str>) -> Self {
        match extension.map(str::to_ascii_lowercase).as_deref() {
            Some("pdf") => Self::Pdf,
            Some("png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "webp") => Self::Image,
            Some("txt" | "md" | "csv") => Self::Text,
            _ => Self::Other,
        }
    }
}
