/*
 * Copyright 2025 Carver Automation Corporation.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Notification classification: event type from generic codes or trap
//! identifiers, then severity and alert kind from static tables.

use netwatch_core::models::{AlertKind, EventType, Severity};
use netwatch_core::snmp::oids;

/// Maps a legacy generic-trap code directly to an event type.
pub fn classify_generic(code: i64) -> EventType {
    match code {
        0 => EventType::ColdStart,
        1 => EventType::WarmStart,
        2 => EventType::LinkDown,
        3 => EventType::LinkUp,
        4 => EventType::AuthenticationFailure,
        5 => EventType::NeighborLoss,
        6 => EventType::VendorSpecific,
        _ => EventType::Unknown,
    }
}

/// Classifies a modern notification identifier: the well-known standard
/// trap identifiers first, then substring heuristics over the identifier
/// text, then UNKNOWN.
pub fn classify_identifier(identifier: &str) -> EventType {
    if let Some(standard) = classify_standard(identifier) {
        return standard;
    }
    classify_heuristic(identifier)
}

fn classify_standard(identifier: &str) -> Option<EventType> {
    let suffix = oids::strip_root(oids::STANDARD_TRAP_PREFIX, identifier)?;
    let code: u32 = suffix.split('.').next()?.parse().ok()?;
    Some(match code {
        1 => EventType::ColdStart,
        2 => EventType::WarmStart,
        3 => EventType::LinkDown,
        4 => EventType::LinkUp,
        5 => EventType::AuthenticationFailure,
        6 => EventType::NeighborLoss,
        _ => return None,
    })
}

fn classify_heuristic(identifier: &str) -> EventType {
    let text = identifier.to_ascii_lowercase();
    if text.contains("temperature") {
        EventType::TemperatureAlarm
    } else if text.contains("fan") {
        EventType::FanFailure
    } else if text.contains("power") {
        EventType::PowerFailure
    } else if text.contains("cpu") {
        EventType::CpuAlarm
    } else if text.contains("memory") {
        EventType::MemoryAlarm
    } else if text.contains("disk") {
        EventType::DiskAlarm
    } else if text.contains("interface") {
        if text.contains("up") {
            EventType::InterfaceUp
        } else {
            EventType::InterfaceDown
        }
    } else if text.contains("config") {
        EventType::ConfigChange
    } else if text.contains("restart") {
        EventType::Restart
    } else {
        EventType::Unknown
    }
}

/// Fixed type-to-severity table.
pub fn severity_of(event_type: EventType) -> Severity {
    match event_type {
        EventType::ColdStart
        | EventType::WarmStart
        | EventType::DeviceDown
        | EventType::PowerFailure
        | EventType::FanFailure => Severity::Critical,

        EventType::LinkDown
        | EventType::InterfaceDown
        | EventType::Restart
        | EventType::AuthenticationFailure => Severity::Major,

        EventType::TemperatureAlarm
        | EventType::CpuAlarm
        | EventType::MemoryAlarm
        | EventType::DiskAlarm => Severity::Minor,

        EventType::LinkUp
        | EventType::InterfaceUp
        | EventType::ConfigChange
        | EventType::NeighborLoss
        | EventType::ThresholdExceeded => Severity::Warning,

        EventType::VendorSpecific | EventType::Unknown => Severity::Info,
    }
}

/// Fixed type-to-alert-kind table.
pub fn alert_kind_of(event_type: EventType) -> AlertKind {
    match event_type {
        EventType::ColdStart | EventType::WarmStart | EventType::Restart | EventType::DeviceDown => {
            AlertKind::Availability
        }
        EventType::LinkDown
        | EventType::LinkUp
        | EventType::InterfaceDown
        | EventType::InterfaceUp
        | EventType::NeighborLoss => AlertKind::Connectivity,
        EventType::PowerFailure | EventType::FanFailure => AlertKind::Hardware,
        EventType::TemperatureAlarm => AlertKind::Environment,
        EventType::CpuAlarm
        | EventType::MemoryAlarm
        | EventType::DiskAlarm
        | EventType::ThresholdExceeded => AlertKind::Performance,
        EventType::AuthenticationFailure => AlertKind::Security,
        EventType::ConfigChange => AlertKind::Configuration,
        EventType::VendorSpecific | EventType::Unknown => AlertKind::Other,
    }
}
