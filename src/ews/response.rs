//! Encode backend schedules as a `GetUserAvailabilityResponse` envelope

use anyhow::Result;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::{MESSAGES_NS, SOAP_ENVELOPE_NS, TYPES_NS, XSD_NS, XSI_NS};
use crate::core::models::{AccountSchedule, BackendScheduleResult, ScheduleItem};

/// Length of `YYYY-MM-DDTHH:MM:SS`
const TIMESTAMP_LEN: usize = 19;

/// Drop sub-second precision and any offset, the client only reads
/// `YYYY-MM-DDTHH:MM:SS`.
pub fn truncate_timestamp(value: &str) -> &str {
    match value.char_indices().nth(TIMESTAMP_LEN) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

fn open(writer: &mut Writer<Vec<u8>>, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
    writer.write_event(Event::Start(start))?;
    Ok(())
}

fn close(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    open(writer, name, &[])?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    close(writer, name)
}

fn write_event_item(writer: &mut Writer<Vec<u8>>, item: &ScheduleItem) -> Result<()> {
    open(writer, "CalendarEvent", &[])?;
    text_element(writer, "StartTime", truncate_timestamp(&item.start))?;
    text_element(writer, "EndTime", truncate_timestamp(&item.end))?;
    // Tentative and out of office are reported as plain busy time
    text_element(writer, "BusyType", "Busy")?;
    close(writer, "CalendarEvent")
}

fn write_free_busy_response(
    writer: &mut Writer<Vec<u8>>,
    schedule: &AccountSchedule,
) -> Result<()> {
    open(writer, "FreeBusyResponse", &[])?;

    open(writer, "ResponseMessage", &[("ResponseClass", "Success")])?;
    text_element(writer, "ResponseCode", "NoError")?;
    close(writer, "ResponseMessage")?;

    open(writer, "FreeBusyView", &[])?;
    open(writer, "FreeBusyViewType", &[("xmlns", TYPES_NS)])?;
    writer.write_event(Event::Text(BytesText::new("FreeBusyMerged")))?;
    close(writer, "FreeBusyViewType")?;

    let mut busy = schedule.items.iter().filter(|item| !item.status.is_free()).peekable();
    if busy.peek().is_none() {
        let empty = BytesStart::new("CalendarEventArray").with_attributes([("xmlns", TYPES_NS)]);
        writer.write_event(Event::Empty(empty))?;
    } else {
        open(writer, "CalendarEventArray", &[("xmlns", TYPES_NS)])?;
        for item in busy {
            write_event_item(writer, item)?;
        }
        close(writer, "CalendarEventArray")?;
    }

    close(writer, "FreeBusyView")?;
    close(writer, "FreeBusyResponse")
}

/// Build the SOAP response body, one `FreeBusyResponse` per schedule in
/// backend order. Free items are left out.
pub fn encode(result: &BackendScheduleResult) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    open(&mut writer, "s:Envelope", &[("xmlns:s", SOAP_ENVELOPE_NS)])?;
    open(&mut writer, "s:Body", &[])?;
    open(
        &mut writer,
        "GetUserAvailabilityResponse",
        &[
            ("xmlns", MESSAGES_NS),
            ("xmlns:xsd", XSD_NS),
            ("xmlns:xsi", XSI_NS),
        ],
    )?;
    open(&mut writer, "FreeBusyResponseArray", &[])?;

    for schedule in &result.schedules {
        write_free_busy_response(&mut writer, schedule)?;
    }

    close(&mut writer, "FreeBusyResponseArray")?;
    close(&mut writer, "GetUserAvailabilityResponse")?;
    close(&mut writer, "s:Body")?;
    close(&mut writer, "s:Envelope")?;

    Ok(writer.into_inner())
}
