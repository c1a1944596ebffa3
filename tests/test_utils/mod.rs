//! Test utilities for integration tests
#![allow(dead_code)]

use std::sync::{Arc, RwLock};

use axum::{Router, body::Body};

use calendar_relay::api::AppState;
use calendar_relay::api::app;
use calendar_relay::core::AppConfig;
use calendar_relay::graph::TokenCache;

/// Config pointing both the identity authority and the scheduling
/// backend at `backend_url`, normally a `mockito` server.
pub fn test_config(backend_url: &str) -> AppConfig {
    AppConfig {
        gate_client_id: String::from("A"),
        gate_client_secret: String::from("B"),
        gate_access_token: String::from("some_access_token"),
        graph_client_id: String::from("test_graph_client_id"),
        graph_client_secret: String::from("test_graph_client_secret"),
        graph_authority: format!("{}/test-tenant", backend_url),
        graph_scope: String::from("https://graph.microsoft.com/.default"),
        graph_api_url: format!("{}/v1.0", backend_url),
        graph_timeout_secs: 5,
        time_zone: String::from("Pacific Standard Time"),
    }
}

/// Creates a test application router backed by `backend_url`
pub fn test_app(backend_url: &str) -> Router {
    let app_state = AppState::new(&test_config(backend_url), Arc::new(TokenCache::new()))
        .expect("Failed to build app state");
    app(Arc::new(RwLock::new(app_state)))
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not utf-8")
}

/// A `GetUserAvailabilityRequest` the way a calendar client sends it
pub fn availability_request(addresses: &[&str]) -> String {
    let mailboxes = addresses
        .iter()
        .map(|address| {
            format!(
                "<ns2:MailboxData><ns2:Email><ns2:Address>{}</ns2:Address></ns2:Email>\
                 <ns2:AttendeeType>Required</ns2:AttendeeType>\
                 <ns2:ExcludeConflicts>false</ns2:ExcludeConflicts></ns2:MailboxData>",
                address
            )
        })
        .collect::<String>();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/" xmlns:ns2="http://schemas.microsoft.com/exchange/services/2006/types" xmlns:ns3="http://schemas.microsoft.com/exchange/services/2006/messages">
  <SOAP-ENV:Header>
    <ns2:RequestServerVersion Version="Exchange2010"/>
  </SOAP-ENV:Header>
  <SOAP-ENV:Body>
    <ns3:GetUserAvailabilityRequest>
      <ns2:TimeZone>
        <ns2:Bias>0</ns2:Bias>
      </ns2:TimeZone>
      <ns3:MailboxDataArray>{}</ns3:MailboxDataArray>
      <ns2:FreeBusyViewOptions>
        <ns2:TimeWindow>
          <ns2:StartTime>2020-10-05T00:00:00</ns2:StartTime>
          <ns2:EndTime>2020-10-06T00:00:00</ns2:EndTime>
        </ns2:TimeWindow>
        <ns2:MergedFreeBusyIntervalInMinutes>30</ns2:MergedFreeBusyIntervalInMinutes>
        <ns2:RequestedView>FreeBusy</ns2:RequestedView>
      </ns2:FreeBusyViewOptions>
    </ns3:GetUserAvailabilityRequest>
  </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#,
        mailboxes
    )
}
