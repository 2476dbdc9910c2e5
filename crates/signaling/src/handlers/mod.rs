//! Handler fuer alle eingehenden Signaling-Events
//!
//! Jeder Handler ist fuer eine Event-Familie zustaendig und hat Zugriff auf
//! den gemeinsamen SignalingState. Handler halten selbst keinen Zustand und
//! blockieren nie.

pub mod direct_call_handler;
pub mod group_call_handler;
pub mod user_handler;
