//! Free/busy lookups against the Graph `getSchedule` action

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::oauth::{BearerToken, CacheKey, TokenCache, acquire_token_for_client};
use crate::core::models::{
    AccountSchedule, AvailabilityQuery, BackendScheduleResult, FreeBusyStatus, ScheduleItem,
};
use crate::core::{AppConfig, RelayError};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DateTimeTimeZone<'a> {
    date_time: &'a str,
    time_zone: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleRequest<'a> {
    schedules: &'a [String],
    start_time: DateTimeTimeZone<'a>,
    end_time: DateTimeTimeZone<'a>,
    availability_view_interval: &'a str,
}

// {
//     "value": [{
//         "scheduleId": "adelev@contoso.com",
//         "availabilityView": "000220000",
//         "scheduleItems": [{
//             "status": "busy",
//             "start": {"dateTime": "2019-03-15T12:00:00.0000000", "timeZone": "Pacific Standard Time"},
//             "end": {"dateTime": "2019-03-15T14:00:00.0000000", "timeZone": "Pacific Standard Time"}
//         }]
//     }]
// }
#[derive(Debug, Deserialize)]
struct ScheduleResponse {
    value: Vec<ScheduleInformation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleInformation {
    schedule_id: Option<String>,
    #[serde(default)]
    schedule_items: Vec<ScheduleItemResponse>,
    error: Option<FreeBusyError>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyError {
    message: Option<String>,
    #[serde(rename = "responseCode")]
    response_code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DateTimeResponse {
    date_time: String,
}

#[derive(Debug, Deserialize)]
struct ScheduleItemResponse {
    // Items without a status still count as busy time
    #[serde(default)]
    status: FreeBusyStatus,
    start: DateTimeResponse,
    end: DateTimeResponse,
}

impl From<ScheduleInformation> for AccountSchedule {
    fn from(info: ScheduleInformation) -> Self {
        AccountSchedule {
            schedule_id: info.schedule_id,
            items: info
                .schedule_items
                .into_iter()
                .map(|item| ScheduleItem {
                    status: item.status,
                    start: item.start.date_time,
                    end: item.end.date_time,
                })
                .collect(),
        }
    }
}

/// Connection details for the scheduling backend
#[derive(Clone, Debug)]
pub struct GraphSettings {
    pub client_id: String,
    pub client_secret: String,
    pub authority: String,
    pub scope: String,
    pub api_url: String,
    pub time_zone: String,
    pub timeout: Duration,
}

impl GraphSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            client_id: config.graph_client_id.clone(),
            client_secret: config.graph_client_secret.clone(),
            authority: config.graph_authority.clone(),
            scope: config.graph_scope.clone(),
            api_url: config.graph_api_url.clone(),
            time_zone: config.time_zone.clone(),
            timeout: Duration::from_secs(config.graph_timeout_secs),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GraphClient {
    http: reqwest::Client,
    settings: GraphSettings,
    tokens: Arc<TokenCache>,
}

impl GraphClient {
    pub fn new(settings: GraphSettings, tokens: Arc<TokenCache>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self {
            http,
            settings,
            tokens,
        })
    }

    async fn access_token(&self) -> Result<BearerToken, RelayError> {
        let key = CacheKey {
            authority: self.settings.authority.clone(),
            scope: self.settings.scope.clone(),
        };
        self.tokens
            .get_or_acquire(key, || {
                acquire_token_for_client(
                    &self.http,
                    &self.settings.authority,
                    &self.settings.client_id,
                    &self.settings.client_secret,
                    &self.settings.scope,
                )
            })
            .await
    }

    /// Look up free/busy schedules for every account in the query.
    ///
    /// The request is sent to the first account's `getSchedule`
    /// endpoint with the full account list in the body. Schedules come
    /// back in whatever order the backend returns them.
    pub async fn fetch(
        &self,
        query: &AvailabilityQuery,
    ) -> Result<BackendScheduleResult, RelayError> {
        let token = self.access_token().await?;

        let window = query.window();
        let payload = ScheduleRequest {
            schedules: query.accounts(),
            start_time: DateTimeTimeZone {
                date_time: &window.start,
                time_zone: &self.settings.time_zone,
            },
            end_time: DateTimeTimeZone {
                date_time: &window.end,
                time_zone: &self.settings.time_zone,
            },
            availability_view_interval: query.merge_interval_minutes(),
        };
        let url = format!(
            "{}/users/{}/calendar/getSchedule",
            self.settings.api_url.trim_end_matches('/'),
            urlencoding::encode(query.first_account())
        );

        tracing::debug!(
            "Requesting schedules for {} account(s) via {}",
            query.accounts().len(),
            query.first_account()
        );

        let response = self
            .http
            .post(url)
            .bearer_auth(token.secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| RelayError::BackendUnavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RelayError::BackendUnavailable(e.to_string()))?;

        if !status.is_success() {
            tracing::error!("getSchedule returned {}: {}", status, body);
            return Err(RelayError::BackendUnavailable(format!(
                "getSchedule returned {}",
                status
            )));
        }

        let parsed: ScheduleResponse = serde_json::from_str(&body).map_err(|e| {
            RelayError::BackendUnavailable(format!("unreadable getSchedule response: {}", e))
        })?;

        let schedules = parsed
            .value
            .into_iter()
            .map(|info| {
                if let Some(err) = &info.error {
                    tracing::warn!(
                        "Schedule {} reported an error ({}): {}",
                        info.schedule_id.as_deref().unwrap_or("<unknown>"),
                        err.response_code.as_deref().unwrap_or("unknown"),
                        err.message.as_deref().unwrap_or("")
                    );
                }
                AccountSchedule::from(info)
            })
            .collect();

        Ok(BackendScheduleResult { schedules })
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Mock, ServerGuard};
    use serde_json::json;

    use super::*;
    use crate::core::models::TimeWindow;

    const SCHEDULE_PATH: &str = r"^/v1\.0/users/[^/]+/calendar/getSchedule$";

    fn settings(server: &ServerGuard) -> GraphSettings {
        GraphSettings {
            client_id: "app-id".to_string(),
            client_secret: "app-secret".to_string(),
            authority: format!("{}/tenant-id", server.url()),
            scope: "https://graph.microsoft.com/.default".to_string(),
            api_url: format!("{}/v1.0", server.url()),
            time_zone: "Pacific Standard Time".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    fn query(accounts: &[&str]) -> AvailabilityQuery {
        AvailabilityQuery::new(
            accounts.iter().map(|a| a.to_string()).collect(),
            TimeWindow {
                start: "2020-10-12T18:00:00".to_string(),
                end: "2020-10-19T18:00:00".to_string(),
            },
            "30".to_string(),
        )
        .unwrap()
    }

    async fn mock_token(server: &mut ServerGuard, hits: usize) -> Mock {
        server
            .mock("POST", "/tenant-id/oauth2/v2.0/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token_type":"Bearer","expires_in":3599,"access_token":"graph-token"}"#)
            .expect(hits)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn it_fetches_schedules() {
        let mut server = mockito::Server::new_async().await;
        let _token = mock_token(&mut server, 1).await;
        let schedule = server
            .mock("POST", "/v1.0/users/first%40example.com/calendar/getSchedule")
            .match_header("authorization", "Bearer graph-token")
            .match_body(Matcher::Json(json!({
                "schedules": ["first@example.com", "second@example.com"],
                "startTime": {"dateTime": "2020-10-12T18:00:00", "timeZone": "Pacific Standard Time"},
                "endTime": {"dateTime": "2020-10-19T18:00:00", "timeZone": "Pacific Standard Time"},
                "availabilityViewInterval": "30"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "value": [
                        {
                            "scheduleId": "second@example.com",
                            "scheduleItems": []
                        },
                        {
                            "scheduleId": "first@example.com",
                            "scheduleItems": [{
                                "status": "tentative",
                                "start": {"dateTime": "2020-10-13T09:00:00.0000000", "timeZone": "Pacific Standard Time"},
                                "end": {"dateTime": "2020-10-13T10:00:00.0000000", "timeZone": "Pacific Standard Time"}
                            }]
                        }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = GraphClient::new(settings(&server), Arc::new(TokenCache::new())).unwrap();
        let result = client
            .fetch(&query(&["first@example.com", "second@example.com"]))
            .await
            .unwrap();

        schedule.assert_async().await;
        // Backend order is kept as-is
        assert_eq!(result.schedules.len(), 2);
        assert_eq!(
            result.schedules[0].schedule_id.as_deref(),
            Some("second@example.com")
        );
        assert!(result.schedules[0].items.is_empty());
        assert_eq!(
            result.schedules[1].items,
            vec![ScheduleItem {
                status: FreeBusyStatus::Tentative,
                start: "2020-10-13T09:00:00.0000000".to_string(),
                end: "2020-10-13T10:00:00.0000000".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn it_reuses_the_token_across_requests() {
        let mut server = mockito::Server::new_async().await;
        let token = mock_token(&mut server, 1).await;
        let _schedule = server
            .mock("POST", Matcher::Regex(SCHEDULE_PATH.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"value": []}"#)
            .expect(2)
            .create_async()
            .await;

        let client = GraphClient::new(settings(&server), Arc::new(TokenCache::new())).unwrap();
        client.fetch(&query(&["a@example.com"])).await.unwrap();
        client.fetch(&query(&["b@example.com"])).await.unwrap();

        token.assert_async().await;
    }

    #[tokio::test]
    async fn it_fails_with_auth_failure_when_no_token() {
        let mut server = mockito::Server::new_async().await;
        let _token = server
            .mock("POST", "/tenant-id/oauth2/v2.0/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_request"}"#)
            .create_async()
            .await;
        let schedule = server
            .mock("POST", Matcher::Regex(SCHEDULE_PATH.to_string()))
            .expect(0)
            .create_async()
            .await;

        let client = GraphClient::new(settings(&server), Arc::new(TokenCache::new())).unwrap();
        let result = client.fetch(&query(&["a@example.com"])).await;

        assert!(matches!(result, Err(RelayError::AuthFailure(_))));
        schedule.assert_async().await;
    }

    #[tokio::test]
    async fn it_fails_on_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _token = mock_token(&mut server, 1).await;
        let _schedule = server
            .mock("POST", Matcher::Regex(SCHEDULE_PATH.to_string()))
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let client = GraphClient::new(settings(&server), Arc::new(TokenCache::new())).unwrap();
        let result = client.fetch(&query(&["a@example.com"])).await;

        assert!(matches!(result, Err(RelayError::BackendUnavailable(_))));
    }

    #[tokio::test]
    async fn it_fails_when_the_reply_has_no_schedules() {
        let mut server = mockito::Server::new_async().await;
        let _token = mock_token(&mut server, 1).await;
        let _schedule = server
            .mock("POST", Matcher::Regex(SCHEDULE_PATH.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"something": "else"}"#)
            .create_async()
            .await;

        let client = GraphClient::new(settings(&server), Arc::new(TokenCache::new())).unwrap();
        let result = client.fetch(&query(&["a@example.com"])).await;

        assert!(matches!(result, Err(RelayError::BackendUnavailable(_))));
    }

    #[tokio::test]
    async fn it_fails_on_non_json_reply() {
        let mut server = mockito::Server::new_async().await;
        let _token = mock_token(&mut server, 1).await;
        let _schedule = server
            .mock("POST", Matcher::Regex(SCHEDULE_PATH.to_string()))
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let client = GraphClient::new(settings(&server), Arc::new(TokenCache::new())).unwrap();
        let result = client.fetch(&query(&["a@example.com"])).await;

        assert!(matches!(result, Err(RelayError::BackendUnavailable(_))));
    }

    #[tokio::test]
    async fn it_treats_items_without_status_as_busy() {
        let mut server = mockito::Server::new_async().await;
        let _token = mock_token(&mut server, 1).await;
        let _schedule = server
            .mock("POST", Matcher::Regex(SCHEDULE_PATH.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "value": [{
                        "scheduleId": "a@example.com",
                        "scheduleItems": [{
                            "start": {"dateTime": "2020-10-13T09:00:00.0000000", "timeZone": "UTC"},
                            "end": {"dateTime": "2020-10-13T10:00:00.0000000", "timeZone": "UTC"}
                        }]
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = GraphClient::new(settings(&server), Arc::new(TokenCache::new())).unwrap();
        let result = client.fetch(&query(&["a@example.com"])).await.unwrap();

        let items = &result.schedules[0].items;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].status, FreeBusyStatus::Unknown);
        assert!(!items[0].status.is_free());
    }

    #[tokio::test]
    async fn it_keeps_schedules_that_report_errors() {
        let mut server = mockito::Server::new_async().await;
        let _token = mock_token(&mut server, 1).await;
        let _schedule = server
            .mock("POST", Matcher::Regex(SCHEDULE_PATH.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "value": [{
                        "scheduleId": "ghost@example.com",
                        "error": {"message": "not found", "responseCode": "ErrorMailRecipientNotFound"}
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = GraphClient::new(settings(&server), Arc::new(TokenCache::new())).unwrap();
        let result = client.fetch(&query(&["ghost@example.com"])).await.unwrap();

        assert_eq!(result.schedules.len(), 1);
        assert!(result.schedules[0].items.is_empty());
    }
}
