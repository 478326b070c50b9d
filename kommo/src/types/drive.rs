use serde::{Deserialize, Serialize};

/// Resposta de `GET /account?with=drive_url`
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub drive_url: Option<String>,
}

/// Resposta de `POST {drive_url}/v1.0/sessions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSession {
    #[serde(default)]
    pub session_id: Option<u64>,
    #[serde(default)]
    pub upload_url: Option<String>,
    #[serde(default)]
    pub max_part_size: Option<u64>,
}

/// Resposta do upload dos bytes
///
/// Os identificadores podem faltar se o Drive aceitar só uma parte do arquivo;
/// quem consome decide o que fazer nesse caso.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub version_uuid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}
