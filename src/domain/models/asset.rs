use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub public_id: String,
    pub url: String,
    pub secure_url: String,
    pub format: Option<String>,
    pub resource_type: String,
    pub bytes: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub created_at: Option<String>,
}

pub struct NewUpload {
    pub folder: Option<String>,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}
