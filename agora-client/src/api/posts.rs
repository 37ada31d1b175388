use agora_core::{
    AgoraResult, AuthUid, CommentId, EntityIdType, Post, PostCount, PostId, PostPage, PostSort,
    VoteDirection,
};
use reqwest::Method;

use super::{not_found_as, ApiClient, NO_BODY};
use crate::types::{CommentBody, NewPostBody, PostListQuery, ReplyBody, ReportBody, TagSearchQuery};

impl ApiClient {
    pub async fn list_posts(&self, sort: PostSort, page: u32, limit: u32) -> AgoraResult<PostPage> {
        let query = PostListQuery { sort, page, limit };
        self.get_json(&["posts"], Some(&query)).await
    }

    /// Every post, unpaginated.
    pub async fn all_posts(&self) -> AgoraResult<Vec<Post>> {
        self.get_json::<_, ()>(&["posts"], None).await
    }

    pub async fn search_posts(&self, tag: &str) -> AgoraResult<Vec<Post>> {
        let query = TagSearchQuery {
            tag: tag.to_string(),
        };
        self.get_json(&["posts", "search"], Some(&query)).await
    }

    pub async fn get_post(&self, post_id: &PostId) -> AgoraResult<Post> {
        self.get_json::<_, ()>(&["post", post_id.as_str()], None)
            .await
            .map_err(not_found_as("post"))
    }

    pub async fn vote_post(&self, post_id: &PostId, direction: VoteDirection) -> AgoraResult<()> {
        let segments = ["post", post_id.as_str(), direction.path_segment()];
        self.send_unit(Method::PUT, &segments, NO_BODY).await
    }

    pub async fn add_comment(&self, post_id: &PostId, body: &CommentBody) -> AgoraResult<()> {
        self.send_unit(Method::POST, &["post", post_id.as_str(), "comment"], Some(body))
            .await
    }

    pub async fn vote_comment(
        &self,
        post_id: &PostId,
        comment_id: &CommentId,
        direction: VoteDirection,
    ) -> AgoraResult<()> {
        let segments = [
            "post",
            post_id.as_str(),
            "comment",
            comment_id.as_str(),
            direction.path_segment(),
        ];
        self.send_unit(Method::PUT, &segments, NO_BODY).await
    }

    pub async fn add_reply(
        &self,
        post_id: &PostId,
        comment_id: &CommentId,
        body: &ReplyBody,
    ) -> AgoraResult<()> {
        let segments = ["post", post_id.as_str(), "comment", comment_id.as_str(), "reply"];
        self.send_unit(Method::POST, &segments, Some(body)).await
    }

    pub async fn report_comment(
        &self,
        post_id: &PostId,
        comment_id: &CommentId,
        body: &ReportBody,
    ) -> AgoraResult<()> {
        let segments = ["post", post_id.as_str(), "comment", comment_id.as_str(), "report"];
        self.send_unit(Method::POST, &segments, Some(body)).await
    }

    pub async fn delete_post(&self, post_id: &PostId) -> AgoraResult<()> {
        self.send_unit(Method::DELETE, &["post", post_id.as_str()], NO_BODY)
            .await
    }

    pub async fn delete_comment(&self, post_id: &PostId, comment_id: &CommentId) -> AgoraResult<()> {
        let segments = ["post", post_id.as_str(), "comment", comment_id.as_str()];
        self.send_unit(Method::DELETE, &segments, NO_BODY).await
    }

    pub async fn user_posts(&self, uid: &AuthUid) -> AgoraResult<Vec<Post>> {
        self.get_json::<_, ()>(&["user", "posts", uid.as_str()], None)
            .await
    }

    pub async fn post_count(&self, uid: &AuthUid) -> AgoraResult<PostCount> {
        self.get_json::<_, ()>(&["user", "post", "count", uid.as_str()], None)
            .await
    }

    pub async fn create_post(&self, uid: &AuthUid, body: &NewPostBody) -> AgoraResult<()> {
        self.send_unit(Method::POST, &["user", "post", uid.as_str()], Some(body))
            .await
    }
}
