//! HTTP query surface
//!
//! Transport-free pieces of the station's tiny web server: request-line
//! routing, the JSON rendering of the latest reading and response headers.
//! The firmware owns the sockets and only shovels bytes through these.
//!
//! | Request          | Response                                   |
//! |------------------|--------------------------------------------|
//! | `GET /`          | static dashboard page                      |
//! | `GET /api/data`  | `{"temperature":T,"pressure":P,"humidity":H}` |
//! | other `GET`      | 404                                        |
//! | other methods    | 405                                        |

use core::fmt::Write;

use heapless::String;

use crate::reading::{CalibratedReading, ReadingPublisher};

pub const DATA_PATH: &str = "/api/data";

/// Dashboard that polls [`DATA_PATH`] every two seconds.
pub const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Room for three fully expanded `f64`s at two decimals plus the keys.
pub const JSON_CAPACITY: usize = 1024;
pub const HEAD_CAPACITY: usize = 160;

pub type JsonBody = String<JSON_CAPACITY>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Index,
    Data,
    NotFound,
    MethodNotAllowed,
    BadRequest,
}

impl Route {
    /// Route on the request line only; headers and body are ignored.
    pub fn from_request(request: &[u8]) -> Self {
        let line_end = request
            .iter()
            .position(|&b| b == b'\r' || b == b'\n')
            .unwrap_or(request.len());
        let Ok(line) = core::str::from_utf8(&request[..line_end]) else {
            return Self::BadRequest;
        };

        let mut parts = line.split(' ');
        let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
            return Self::BadRequest;
        };
        if method != "GET" {
            return Self::MethodNotAllowed;
        }

        let path = target.split('?').next().unwrap_or(target);
        match path {
            "/" | "/index.html" => Self::Index,
            DATA_PATH => Self::Data,
            _ => Self::NotFound,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
    MethodNotAllowed,
}

impl Status {
    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
        }
    }

    pub const fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::BadRequest => "Bad Request",
            Self::NotFound => "Not Found",
            Self::MethodNotAllowed => "Method Not Allowed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Html(&'static str),
    Json(JsonBody),
    Text(&'static str),
}

impl Body {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Html(html) => html.as_bytes(),
            Self::Json(json) => json.as_bytes(),
            Self::Text(text) => text.as_bytes(),
        }
    }

    pub const fn content_type(&self) -> &'static str {
        match self {
            Self::Html(_) => "text/html; charset=utf-8",
            Self::Json(_) => "application/json",
            Self::Text(_) => "text/plain",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: Status,
    pub body: Body,
}

impl Response {
    /// Build the response for `route`. Only [`Route::Data`] touches the
    /// publisher, and that never blocks.
    pub fn for_route(route: Route, publisher: &ReadingPublisher) -> Self {
        let (status, body) = match route {
            Route::Index => (Status::Ok, Body::Html(INDEX_HTML)),
            Route::Data => (
                Status::Ok,
                Body::Json(render_json(&publisher.get_latest_reading())),
            ),
            Route::NotFound => (Status::NotFound, Body::Text("Not Found")),
            Route::MethodNotAllowed => (Status::MethodNotAllowed, Body::Text("Method Not Allowed")),
            Route::BadRequest => (Status::BadRequest, Body::Text("Bad Request")),
        };
        Self { status, body }
    }

    /// Status line and headers, including the blank separator line.
    pub fn head(&self) -> String<HEAD_CAPACITY> {
        let mut head = String::new();
        // Fits: the longest reason, content type and a usize length are well under capacity.
        let _ = write!(
            head,
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.status.code(),
            self.status.reason(),
            self.body.content_type(),
            self.body.as_bytes().len()
        );
        head
    }
}

/// `{"temperature":21.37,"pressure":1006.41,"humidity":50.72}`
pub fn render_json(reading: &CalibratedReading) -> JsonBody {
    let mut json = String::new();
    let _ = write!(
        json,
        "{{\"temperature\":{:.2},\"pressure\":{:.2},\"humidity\":{:.2}}}",
        reading.temperature, reading.pressure, reading.humidity
    );
    json
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_known_paths() {
        assert_eq!(Route::from_request(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n"), Route::Index);
        assert_eq!(Route::from_request(b"GET /api/data HTTP/1.1\r\n\r\n"), Route::Data);
        assert_eq!(Route::from_request(b"GET /api/data?t=1 HTTP/1.1\r\n"), Route::Data);
        assert_eq!(Route::from_request(b"GET /favicon.ico HTTP/1.1\r\n"), Route::NotFound);
    }

    #[test]
    fn test_rejects_other_methods_and_garbage() {
        assert_eq!(
            Route::from_request(b"POST /api/data HTTP/1.1\r\n"),
            Route::MethodNotAllowed
        );
        assert_eq!(Route::from_request(b""), Route::BadRequest);
        assert_eq!(Route::from_request(b"GET\r\n"), Route::BadRequest);
        assert_eq!(Route::from_request(&[0xFF, 0xFE, b' ', b'/']), Route::BadRequest);
    }

    #[test]
    fn test_json_uses_two_decimals() {
        let reading = CalibratedReading {
            temperature: 25.00001356852017,
            pressure: 1006.4056778397829,
            humidity: 50.72466053746483,
        };

        assert_eq!(
            render_json(&reading).as_str(),
            r#"{"temperature":25.00,"pressure":1006.41,"humidity":50.72}"#
        );
    }

    #[test]
    fn test_sentinel_renders_as_zeros() {
        let publisher = ReadingPublisher::new();
        let response = Response::for_route(Route::Data, &publisher);

        assert_eq!(response.status, Status::Ok);
        assert_eq!(
            response.body.as_bytes(),
            br#"{"temperature":0.00,"pressure":0.00,"humidity":0.00}"#
        );
    }

    #[test]
    fn test_head_reports_body_length() {
        let response = Response {
            status: Status::NotFound,
            body: Body::Text("Not Found"),
        };

        assert_eq!(
            response.head().as_str(),
            "HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\nContent-Length: 9\r\nConnection: close\r\n\r\n"
        );
    }

    #[test]
    fn test_index_serves_dashboard() {
        let response = Response::for_route(Route::Index, &ReadingPublisher::new());

        assert_eq!(response.body.content_type(), "text/html; charset=utf-8");
        assert!(INDEX_HTML.contains(DATA_PATH));
    }
}
