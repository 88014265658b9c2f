// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Prometheus registry for device telemetry.
//!
//! [`HartMetrics`] owns an explicitly constructed [`Registry`]; nothing is
//! registered globally. The telemetry publisher writes through it and the
//! exposition endpoint renders it.
//!
//! # Metrics Overview
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `app_info` | Gauge | `version` |
//! | `device_info` | Gauge | `ManufacturerId`, `DeviceType`, `DeviceId` |
//! | `device_info_cmd13` | Gauge | `Tag`, `Descriptor`, `Date` |
//! | `device_pv_value` | Gauge | `unit` |
//! | `device_sv_value` | Gauge | `unit` |
//! | `device_tv_value` | Gauge | `unit` |
//! | `device_fv_value` | Gauge | `unit` |
//! | `device_current_value` | Gauge | |
//! | `device_percent_of_range_value` | Gauge | |
//! | `device_lower_range_value` | Gauge | `unit` |
//! | `device_upper_range_value` | Gauge | `unit` |
//! | `device_damping_value` | Gauge | |
//! | `device_status_total` | Counter | `status` |
//! | `command_status_total` | Counter | `status` |
//! | `communication_errors_total` | Counter | `flag` |
//! | `command_errors_total` | Counter | `error` |
//!
//! After [`HartMetrics::shutdown`] every write is a no-op.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use prometheus::core::Collector;
use prometheus::proto::MetricType;
use prometheus::{CounterVec, Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};

use crate::error::{MetricsError, MetricsResult};
use crate::status::{CommErrorFlag, CommandStatus, DeviceStatus};
use crate::types::{DeviceIdentity, ProcessVariable};
use crate::units::UnitCode;

/// Content type of the text exposition format.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

const DEVICE_INFO_LABELS: [&str; 3] = ["ManufacturerId", "DeviceType", "DeviceId"];
const TAG_INFO_LABELS: [&str; 3] = ["Tag", "Descriptor", "Date"];
const UNIT_LABELS: [&str; 1] = ["unit"];

// =============================================================================
// Options
// =============================================================================

/// Registry construction options.
#[derive(Debug, Clone, Default)]
pub struct MetricsOptions {
    /// Prefix for every family name. Empty means none.
    pub namespace: String,
    /// Value of the `version` label on `app_info`.
    pub version: Option<String>,
}

impl MetricsOptions {
    /// Sets the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the application version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// The four dynamic variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableSlot {
    /// Primary variable.
    Pv,
    /// Secondary variable.
    Sv,
    /// Tertiary variable.
    Tv,
    /// Quaternary variable.
    Fv,
}

// =============================================================================
// HartMetrics
// =============================================================================

/// Owned registry plus every metric family the exporter publishes.
pub struct HartMetrics {
    registry: Registry,
    namespace: String,
    enabled: AtomicBool,

    device_info: GaugeVec,
    device_info_cmd13: GaugeVec,
    pv: GaugeVec,
    sv: GaugeVec,
    tv: GaugeVec,
    fv: GaugeVec,
    current: Gauge,
    percent_of_range: Gauge,
    lower_range: GaugeVec,
    upper_range: GaugeVec,
    damping: Gauge,
    device_status: CounterVec,
    command_status: CounterVec,
    communication_errors: CounterVec,
    command_errors: CounterVec,
}

impl HartMetrics {
    /// Builds the registry and sets `app_info{version}` to 1.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError::Registration` if a family name is invalid
    /// (for example a namespace with illegal characters).
    pub fn new(options: MetricsOptions) -> MetricsResult<Self> {
        let registry = Registry::new();
        let ns = options.namespace.as_str();

        let app_info = gauge_vec(&registry, ns, "app_info", "Application information", &["version"])?;
        let version = options
            .version
            .unwrap_or_else(|| crate::VERSION.to_string());
        app_info.with_label_values(&[version.as_str()]).set(1.0);

        let metrics = Self {
            device_info: gauge_vec(
                &registry,
                ns,
                "device_info",
                "Device identity from command 0",
                &DEVICE_INFO_LABELS,
            )?,
            device_info_cmd13: gauge_vec(
                &registry,
                ns,
                "device_info_cmd13",
                "Tag, descriptor and date from command 13",
                &TAG_INFO_LABELS,
            )?,
            pv: gauge_vec(&registry, ns, "device_pv_value", "Primary variable", &UNIT_LABELS)?,
            sv: gauge_vec(&registry, ns, "device_sv_value", "Secondary variable", &UNIT_LABELS)?,
            tv: gauge_vec(&registry, ns, "device_tv_value", "Tertiary variable", &UNIT_LABELS)?,
            fv: gauge_vec(&registry, ns, "device_fv_value", "Quaternary variable", &UNIT_LABELS)?,
            current: gauge(&registry, ns, "device_current_value", "Loop current in mA")?,
            percent_of_range: gauge(
                &registry,
                ns,
                "device_percent_of_range_value",
                "Primary variable as percent of range",
            )?,
            lower_range: gauge_vec(
                &registry,
                ns,
                "device_lower_range_value",
                "Lower range value",
                &UNIT_LABELS,
            )?,
            upper_range: gauge_vec(
                &registry,
                ns,
                "device_upper_range_value",
                "Upper range value",
                &UNIT_LABELS,
            )?,
            damping: gauge(&registry, ns, "device_damping_value", "Damping in seconds")?,
            device_status: counter_vec(
                &registry,
                ns,
                "device_status_total",
                "Replies by device status",
                &["status"],
            )?,
            command_status: counter_vec(
                &registry,
                ns,
                "command_status_total",
                "Replies by command status",
                &["status"],
            )?,
            communication_errors: counter_vec(
                &registry,
                ns,
                "communication_errors_total",
                "Communication fault bits by flag",
                &["flag"],
            )?,
            command_errors: counter_vec(
                &registry,
                ns,
                "command_errors_total",
                "Failed commands by error description",
                &["error"],
            )?,
            registry,
            namespace: options.namespace,
            enabled: AtomicBool::new(true),
        };

        Ok(metrics)
    }

    /// Returns `true` until [`shutdown`](Self::shutdown) is called.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Disables every subsequent write.
    pub fn shutdown(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    /// Renders the registry in the text exposition format.
    pub fn encode_text(&self) -> MetricsResult<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| MetricsError::Encode {
                message: e.to_string(),
            })?;
        String::from_utf8(buffer).map_err(|e| MetricsError::Encode {
            message: e.to_string(),
        })
    }

    /// Reads back the current value of a gauge or counter sample.
    ///
    /// `name` is the family name without namespace. Every pair in `labels`
    /// must match; other labels are ignored.
    pub fn value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        let full_name = if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}_{}", self.namespace, name)
        };

        let families = self.registry.gather();
        let family = families.iter().find(|f| f.get_name() == full_name)?;
        let metric_type = family.get_field_type();

        family
            .get_metric()
            .iter()
            .find(|metric| {
                labels.iter().all(|(key, value)| {
                    metric
                        .get_label()
                        .iter()
                        .any(|pair| pair.get_name() == *key && pair.get_value() == *value)
                })
            })
            .map(|metric| match metric_type {
                MetricType::COUNTER => metric.get_counter().get_value(),
                _ => metric.get_gauge().get_value(),
            })
    }

    // =========================================================================
    // Writers
    // =========================================================================

    /// Publishes the device identity.
    pub fn set_device_info(&self, identity: &DeviceIdentity) {
        if !self.is_enabled() {
            return;
        }
        let manufacturer = identity.manufacturer_label();
        let device_type = identity.device_type_label();
        let device_id = identity.device_id_label();
        replace_series(
            &self.device_info,
            &DEVICE_INFO_LABELS,
            &[manufacturer.as_str(), device_type.as_str(), device_id.as_str()],
            1.0,
        );
    }

    /// Publishes tag, descriptor and date.
    pub fn set_tag_info(&self, tag: &str, descriptor: &str, date: NaiveDate) {
        if !self.is_enabled() {
            return;
        }
        let date = date.format("%Y-%m-%d").to_string();
        replace_series(
            &self.device_info_cmd13,
            &TAG_INFO_LABELS,
            &[tag, descriptor, date.as_str()],
            1.0,
        );
    }

    /// Publishes one dynamic variable. A unit change drops the old series.
    pub fn set_variable(&self, slot: VariableSlot, variable: &ProcessVariable) {
        if !self.is_enabled() {
            return;
        }
        let vec = match slot {
            VariableSlot::Pv => &self.pv,
            VariableSlot::Sv => &self.sv,
            VariableSlot::Tv => &self.tv,
            VariableSlot::Fv => &self.fv,
        };
        set_unit_gauge(vec, variable.unit, variable.value);
    }

    /// Publishes the loop current.
    pub fn set_loop_current(&self, milliamperes: f64) {
        if !self.is_enabled() {
            return;
        }
        self.current.set(milliamperes);
    }

    /// Publishes percent of range.
    pub fn set_percent_of_range(&self, percent: f64) {
        if !self.is_enabled() {
            return;
        }
        self.percent_of_range.set(percent);
    }

    /// Publishes the output range and damping.
    pub fn set_output_range(&self, unit: UnitCode, lower: f64, upper: f64, damping_s: f64) {
        if !self.is_enabled() {
            return;
        }
        set_unit_gauge(&self.lower_range, unit, lower);
        set_unit_gauge(&self.upper_range, unit, upper);
        self.damping.set(damping_s);
    }

    /// Counts one reply by device status.
    pub fn inc_device_status(&self, status: DeviceStatus) {
        if !self.is_enabled() {
            return;
        }
        self.device_status
            .with_label_values(&[status.to_string().as_str()])
            .inc();
    }

    /// Counts one reply by command status.
    pub fn inc_command_status(&self, status: CommandStatus) {
        if !self.is_enabled() {
            return;
        }
        self.command_status
            .with_label_values(&[status.to_string().as_str()])
            .inc();
    }

    /// Counts one communication fault bit.
    pub fn inc_communication_error(&self, flag: CommErrorFlag) {
        if !self.is_enabled() {
            return;
        }
        self.communication_errors
            .with_label_values(&[flag.as_str()])
            .inc();
    }

    /// Counts one plain command error.
    pub fn inc_command_error(&self, description: &str) {
        if !self.is_enabled() {
            return;
        }
        self.command_errors.with_label_values(&[description]).inc();
    }
}

impl std::fmt::Debug for HartMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HartMetrics")
            .field("namespace", &self.namespace)
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Registration Helpers
// =============================================================================

fn opts(namespace: &str, name: &str, help: &str) -> Opts {
    Opts::new(name, help).namespace(namespace)
}

fn gauge(registry: &Registry, ns: &str, name: &str, help: &str) -> MetricsResult<Gauge> {
    let gauge = Gauge::with_opts(opts(ns, name, help))?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

fn gauge_vec(
    registry: &Registry,
    ns: &str,
    name: &str,
    help: &str,
    labels: &[&str],
) -> MetricsResult<GaugeVec> {
    let vec = GaugeVec::new(opts(ns, name, help), labels)?;
    registry.register(Box::new(vec.clone()))?;
    Ok(vec)
}

fn counter_vec(
    registry: &Registry,
    ns: &str,
    name: &str,
    help: &str,
    labels: &[&str],
) -> MetricsResult<CounterVec> {
    let vec = CounterVec::new(opts(ns, name, help), labels)?;
    registry.register(Box::new(vec.clone()))?;
    Ok(vec)
}

fn set_unit_gauge(vec: &GaugeVec, unit: UnitCode, value: f64) {
    let unit = unit.to_string();
    replace_series(vec, &UNIT_LABELS, &[unit.as_str()], value);
}

/// Sets one series, then removes every other series of the family.
///
/// The live series is never absent, so a concurrent scrape sees either the
/// old or the new label set.
fn replace_series(vec: &GaugeVec, names: &[&str], values: &[&str], value: f64) {
    vec.with_label_values(values).set(value);

    let current: HashMap<&str, &str> = names.iter().copied().zip(values.iter().copied()).collect();
    for family in vec.collect() {
        for metric in family.get_metric() {
            let labels: HashMap<&str, &str> = metric
                .get_label()
                .iter()
                .map(|pair| (pair.get_name(), pair.get_value()))
                .collect();
            if labels != current {
                // Already gone if another writer removed it first.
                let _ = vec.remove(&labels);
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
