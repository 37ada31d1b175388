use agora_core::{AgoraResult, ReportPage};

use super::ApiClient;
use crate::types::PageQuery;

impl ApiClient {
    pub async fn list_reports(&self, page: u32, limit: u32) -> AgoraResult<ReportPage> {
        self.get_json(&["reports"], Some(&PageQuery { page, limit }))
            .await
    }
}
