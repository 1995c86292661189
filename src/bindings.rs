//! Python host bindings.
//!
//! `LogAssistant` owns a tokio runtime, the scan engine and the periodic
//! trigger. Blocking calls release the GIL while the runtime works; engine
//! events are forwarded to an optional Python callback as
//! `callback(kind, payload_json)`.

use std::sync::Arc;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use serde_json::Value;

use crate::config::{
    AssistantConfig, DEFAULT_API_BASE, DEFAULT_LOG_PATH, DEFAULT_MODEL_NAME,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SCAN_INTERVAL_SECS,
};
use crate::extraction::patterns::Category;
use crate::logging::init_logger;
use crate::pipeline::engine::{ScanEngine, ScanOutcome};
use crate::pipeline::notify::{AssistantEvent, LoggingSink, NotificationSink};
use crate::trigger::PeriodicTrigger;

/// Forwards engine events to a Python callable.
struct PyCallbackSink {
    callback: PyObject,
}

impl NotificationSink for PyCallbackSink {
    fn notify(&self, event: AssistantEvent) {
        let payload = event.payload().to_string();
        Python::with_gil(|py| {
            if let Err(e) = self.callback.call1(py, (event.kind(), payload)) {
                log::warn!("CALLBACK_FAILED kind={} error={}", event.kind(), e);
            }
        });
    }
}

fn json_to_py(py: Python<'_>, value: &Value) -> PyResult<PyObject> {
    Ok(match value {
        Value::Null => py.None(),
        Value::Bool(b) => (*b).into_py(py),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.into_py(py),
            None => n.as_f64().unwrap_or_default().into_py(py),
        },
        Value::String(s) => s.as_str().into_py(py),
        Value::Array(items) => {
            let list = PyList::empty(py);
            for item in items {
                list.append(json_to_py(py, item)?)?;
            }
            list.into()
        }
        Value::Object(map) => {
            let dict = PyDict::new(py);
            for (key, item) in map {
                dict.set_item(key, json_to_py(py, item)?)?;
            }
            dict.into()
        }
    })
}

fn to_py<T: serde::Serialize>(py: Python<'_>, value: &T) -> PyResult<PyObject> {
    let json = serde_json::to_value(value).map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
    json_to_py(py, &json)
}

#[pyclass]
pub struct LogAssistant {
    runtime: tokio::runtime::Runtime,
    engine: Arc<ScanEngine>,
    trigger: Option<PeriodicTrigger>,
    config: AssistantConfig,
}

#[pymethods]
impl LogAssistant {
    #[new]
    #[pyo3(signature = (
        api_key,
        model_name = DEFAULT_MODEL_NAME.to_string(),
        log_path = DEFAULT_LOG_PATH.to_string(),
        scan_interval = DEFAULT_SCAN_INTERVAL_SECS,
        api_base = DEFAULT_API_BASE.to_string(),
        request_timeout = DEFAULT_REQUEST_TIMEOUT_SECS,
        callback = None
    ))]
    fn new(
        api_key: String,
        model_name: String,
        log_path: String,
        scan_interval: u64,
        api_base: String,
        request_timeout: u64,
        callback: Option<PyObject>,
    ) -> PyResult<Self> {
        init_logger();

        let config = AssistantConfig {
            api_key,
            model_name,
            log_path: log_path.into(),
            scan_interval,
            api_base,
            request_timeout,
        };
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("log-assistant")
            .enable_all()
            .build()
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;

        let sink: Arc<dyn NotificationSink> = match callback {
            Some(callback) => Arc::new(PyCallbackSink { callback }),
            None => Arc::new(LoggingSink),
        };

        let engine = ScanEngine::from_config(&config, sink)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;

        Ok(Self {
            runtime,
            engine: Arc::new(engine),
            trigger: None,
            config,
        })
    }

    /// Skip existing log content, run the first scan, then scan periodically.
    fn start(&mut self, py: Python<'_>) -> PyResult<()> {
        if self.trigger.is_some() {
            return Ok(());
        }

        let engine = Arc::clone(&self.engine);
        let runtime = &self.runtime;
        py.allow_threads(|| {
            engine.initialize();
            runtime.block_on(engine.scan());
        });

        let _enter = self.runtime.enter();
        self.trigger = Some(PeriodicTrigger::start(
            Arc::clone(&self.engine),
            self.config.scan_interval(),
        ));

        log::info!(
            "LOG_ASSISTANT_STARTED path={} interval_secs={}",
            self.config.log_path.display(),
            self.config.scan_interval
        );
        Ok(())
    }

    /// Stop periodic scans; a cycle already running is allowed to finish.
    fn shutdown(&mut self, py: Python<'_>) -> PyResult<()> {
        if let Some(trigger) = self.trigger.take() {
            let runtime = &self.runtime;
            py.allow_threads(|| runtime.block_on(trigger.shutdown()));
            log::info!("LOG_ASSISTANT_SHUTDOWN");
        }
        Ok(())
    }

    /// Manual scan. Returns `{"status": ..., ...report}`.
    fn analyze_logs(&self, py: Python<'_>) -> PyResult<PyObject> {
        let engine = Arc::clone(&self.engine);
        let runtime = &self.runtime;
        let outcome = py.allow_threads(|| runtime.block_on(engine.analyze_logs()));

        let result = PyDict::new(py);
        match outcome {
            ScanOutcome::MissingFile => result.set_item("status", "missing_file")?,
            ScanOutcome::NoNewData => result.set_item("status", "no_new_data")?,
            ScanOutcome::Failed(reason) => {
                result.set_item("status", "failed")?;
                result.set_item("error", reason)?;
            }
            ScanOutcome::Completed(report) => {
                result.set_item("status", "completed")?;
                result.set_item("report", to_py(py, &report)?)?;
            }
        }
        Ok(result.into())
    }

    /// Stored issues. `limit <= 0` and an empty `issue_type` are ignored;
    /// an unknown `issue_type` gives an empty list.
    #[pyo3(signature = (limit = None, issue_type = None))]
    fn get_issues(
        &self,
        py: Python<'_>,
        limit: Option<i64>,
        issue_type: Option<String>,
    ) -> PyResult<PyObject> {
        let issues = self
            .engine
            .get_issues_by_name(limit, issue_type.as_deref());
        to_py(py, &issues)
    }

    fn clear_issues(&self) -> PyResult<()> {
        self.engine.clear_issues();
        Ok(())
    }

    fn summary(&self, py: Python<'_>) -> PyResult<PyObject> {
        to_py(py, &self.engine.summary())
    }

    #[getter]
    fn cursor(&self) -> u64 {
        self.engine.cursor()
    }

    #[getter]
    fn running(&self) -> bool {
        self.trigger.is_some()
    }
}

/// Python module definition
#[pymodule]
fn log_assistant_core(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    init_logger();
    m.add_class::<LogAssistant>()?;
    m.add("CATEGORIES", Category::ALL.iter().map(Category::as_str).collect::<Vec<_>>())?;
    Ok(())
}
