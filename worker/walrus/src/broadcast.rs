//! Direct broadcast of row changes from trigger context, bypassing the
//! WAL pipeline.

use crate::errors::Error;
use log::{debug, error};
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerLevel {
    Row,
    Statement,
}

impl FromStr for TriggerLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ROW" => Ok(Self::Row),
            "STATEMENT" => Ok(Self::Statement),
            other => Err(Error::Usage(format!("unknown trigger level {}", other))),
        }
    }
}

/// A message handed to the realtime transport
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastMessage {
    pub topic: String,
    pub event: String,
    pub payload: Value,
    pub private: bool,
}

pub trait MessageSink {
    fn send(&mut self, message: &BroadcastMessage) -> Result<(), Error>;
}

#[derive(Serialize, Debug, Clone, PartialEq)]
struct Payload<'a> {
    old_record: &'a Option<Value>,
    operation: &'a str,
    record: &'a Option<Value>,
    schema: &'a str,
    table: &'a str,
}

/// A row change as seen by a trigger
#[derive(Debug, Clone, PartialEq)]
pub struct RowTrigger {
    pub topic: String,
    pub event: String,
    pub operation: String,
    pub table: String,
    pub schema: String,
    pub new_row: Option<Value>,
    pub old_row: Option<Value>,
    pub level: TriggerLevel,
}

pub fn broadcast_changes<S: MessageSink>(sink: &mut S, trigger: &RowTrigger) -> Result<(), Error> {
    if trigger.level != TriggerLevel::Row {
        return Err(Error::Usage(
            "function can only be triggered for each row, not for each statement".to_string(),
        ));
    }

    let payload = serde_json::to_value(Payload {
        old_record: &trigger.old_row,
        operation: &trigger.operation,
        record: &trigger.new_row,
        schema: &trigger.schema,
        table: &trigger.table,
    })
    .map_err(|x| Error::Broadcast(format!("{}", x)))?;

    let message = BroadcastMessage {
        topic: trigger.topic.clone(),
        event: trigger.event.clone(),
        payload,
        private: true,
    };

    match sink.send(&message) {
        Ok(()) => {
            debug!("Broadcast {} on {}", message.event, message.topic);
            Ok(())
        }
        Err(Error::Broadcast(x)) => Err(Error::Broadcast(x)),
        Err(err) => {
            error!("Failed to send broadcast on {}: {}", message.topic, err);
            Err(Error::Broadcast(err.to_string()))
        }
    }
}
