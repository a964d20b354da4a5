use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{GraphError, GraphResult};
use crate::types::*;

const GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Read-only list query: first N items, explicit field selection,
/// server-side ordering.
#[derive(Debug, Clone, Copy)]
pub struct ListQuery {
    pub top: u32,
    pub select: &'static str,
    pub order_by: &'static str,
}

/// Newest messages first, envelope fields only
const INBOX_QUERY: ListQuery = ListQuery {
    top: 10,
    select: "subject,from,receivedDateTime,isRead",
    order_by: "receivedDateTime desc",
};

/// Events with the greatest start date first
const EVENTS_QUERY: ListQuery = ListQuery {
    top: 10,
    select: "subject,start,end,attendees",
    order_by: "start/dateTime desc",
};

/// Contacts alphabetically by given name
const CONTACTS_QUERY: ListQuery = ListQuery {
    top: 10,
    select: "givenName,surname,emailAddresses",
    order_by: "givenName ASC",
};

/// Graph client bound to one access token for the duration of a request.
pub struct GraphClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    anchor_mailbox: Option<String>,
}

impl GraphClient {
    pub fn new(access_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: GRAPH_BASE.to_string(),
            access_token,
            anchor_mailbox: None,
        }
    }

    /// Route requests to the mailbox of this address via the
    /// `X-AnchorMailbox` header.
    pub fn with_anchor_mailbox(mut self, address: impl Into<String>) -> Self {
        self.anchor_mailbox = Some(address.into());
        self
    }

    /// Point the client at a different API root (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch the signed-in user from `/me`.
    pub async fn get_user(&self) -> GraphResult<GraphUser> {
        let url = format!("{}/me", self.base_url);
        debug!("Graph: fetching signed-in user");
        self.get_json(&url).await
    }

    /// The 10 newest inbox messages.
    pub async fn list_inbox_messages(&self) -> GraphResult<Vec<MessageRow>> {
        let url = self.list_url("/me/mailfolders/inbox/messages", INBOX_QUERY);
        debug!("Graph: listing inbox messages");

        let list: GraphListResponse<GraphMessage> = self.get_json(&url).await?;
        info!("Graph: got {} messages", list.value.len());
        Ok(list.value.into_iter().map(MessageRow::from).collect())
    }

    /// The 10 events with the greatest start date.
    pub async fn list_events(&self) -> GraphResult<Vec<EventRow>> {
        let url = self.list_url("/me/events", EVENTS_QUERY);
        debug!("Graph: listing events");

        let list: GraphListResponse<GraphEvent> = self.get_json(&url).await?;
        info!("Graph: got {} events", list.value.len());
        Ok(list.value.into_iter().map(EventRow::from).collect())
    }

    /// The first 10 contacts by given name.
    pub async fn list_contacts(&self) -> GraphResult<Vec<ContactRow>> {
        let url = self.list_url("/me/contacts", CONTACTS_QUERY);
        debug!("Graph: listing contacts");

        let list: GraphListResponse<GraphContact> = self.get_json(&url).await?;
        info!("Graph: got {} contacts", list.value.len());
        Ok(list.value.into_iter().map(ContactRow::from).collect())
    }

    fn list_url(&self, path: &str, query: ListQuery) -> String {
        format!(
            "{}{}?$select={}&$top={}&$orderby={}",
            self.base_url, path, query.select, query.top, query.order_by
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> GraphResult<T> {
        let mut request = self.client.get(url).bearer_auth(&self.access_token);
        if let Some(anchor) = &self.anchor_mailbox {
            request = request.header("X-AnchorMailbox", anchor);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::Api { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| GraphError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbox_list_url() {
        let client = GraphClient::new("token".to_string());
        let url = client.list_url("/me/mailfolders/inbox/messages", INBOX_QUERY);
        assert_eq!(
            url,
            "https://graph.microsoft.com/v1.0/me/mailfolders/inbox/messages\
             ?$select=subject,from,receivedDateTime,isRead&$top=10&$orderby=receivedDateTime desc"
        );
    }

    #[test]
    fn test_base_url_override() {
        let client = GraphClient::new("token".to_string()).with_base_url("http://127.0.0.1:9999");
        let url = client.list_url("/me/contacts", CONTACTS_QUERY);
        assert!(url.starts_with("http://127.0.0.1:9999/me/contacts?"));
        assert!(url.contains("$orderby=givenName ASC"));
    }
}
