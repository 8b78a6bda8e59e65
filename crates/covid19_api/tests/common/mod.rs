#![allow(dead_code)]

use covid19_api::{BoxError, HttpRequest, HttpResponse, Sleep, Transport};
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replays scripted responses in order and records every request it sees.
#[derive(Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<VecDeque<Result<HttpResponse, String>>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockTransport {
    pub fn respond(self, status: u16, body: &str) -> Self {
        let status = StatusCode::from_u16(status).unwrap();
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        self.requests.lock().unwrap().push(request);
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(message.into()),
            None => Err("no scripted response left".into()),
        }
    }
}

#[derive(Clone, Default)]
pub struct RecordingSleep {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleep {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Sleep for RecordingSleep {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Collects formatted log output so tests can assert on it.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub const TWO_REPORTS: &str = r#"{
    "Code": 200,
    "Message": "OK",
    "Document": [
        {"id": 1, "province_state": "Hubei", "country_region": "China",
         "last_update": "2020-09-01 04:28:22", "confirmed": 68139,
         "deaths": 4512, "recovered": 63627},
        {"id": 2, "province_state": "", "country_region": "Italy",
         "last_update": "2020-09-01 04:28:22", "confirmed": 269214,
         "deaths": 35483, "recovered": 207944}
    ]
}"#;

pub const ONE_SERIES: &str = r#"{"Code":200,"Message":"OK","Document":[
    {"id":1,"province_state":"X","country_region":"Y","latitude":1.5,"longitude":-2.25,
     "1/22/20":5,"1/23/20":7}
]}"#;
