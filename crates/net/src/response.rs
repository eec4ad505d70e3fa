//! HTTP response summary

/// What the render surface keeps of a fetched page
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Vec<u8>,
}

impl Response {
    /// Body length in bytes
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Whether the body is empty
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len() {
        let r = Response {
            status: 200,
            body: b"<html></html>".to_vec(),
        };
        assert_eq!(r.len(), 13);
        assert!(!r.is_empty());
    }
}
