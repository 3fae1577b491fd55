//! TCP side of the HTTP server
//!
//! One connection at a time on port 80: read until the end of the request
//! head, route it with [`meteo_core::http`], write the response and close.
//! Queries only read the publisher, so sampling never waits on a client.

use embassy_net::Stack;
use embassy_net::tcp::{Error as TcpError, TcpSocket};
use embassy_time::Duration;
use log::{debug, warn};
use meteo_core::http::{Response, Route};
use meteo_core::reading::ReadingPublisher;

pub const HTTP_PORT: u16 = 80;

const SOCKET_TIMEOUT: Duration = Duration::from_secs(10);
const RX_BUFFER: usize = 1024;
const TX_BUFFER: usize = 2048;
const REQUEST_BUFFER: usize = 512;

/// Accept and answer clients forever.
pub async fn serve(stack: Stack<'static>, publisher: &'static ReadingPublisher) -> ! {
    let mut rx_buffer = [0u8; RX_BUFFER];
    let mut tx_buffer = [0u8; TX_BUFFER];

    loop {
        let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Some(SOCKET_TIMEOUT));

        if let Err(e) = socket.accept(HTTP_PORT).await {
            warn!("HTTP accept failed: {:?}", e);
            continue;
        }
        debug!("HTTP client {:?}", socket.remote_endpoint());

        if let Err(e) = handle(&mut socket, publisher).await {
            warn!("HTTP connection dropped: {:?}", e);
        }

        socket.close();
        let _ = socket.flush().await;
        socket.abort();
    }
}

async fn handle(
    socket: &mut TcpSocket<'_>,
    publisher: &ReadingPublisher,
) -> Result<(), TcpError> {
    let mut request = [0u8; REQUEST_BUFFER];
    let len = read_head(socket, &mut request).await?;

    let route = Route::from_request(&request[..len]);
    let response = Response::for_route(route, publisher);
    debug!("HTTP {:?} -> {}", route, response.status.code());

    write_all(socket, response.head().as_bytes()).await?;
    write_all(socket, response.body.as_bytes()).await?;
    socket.flush().await
}

async fn write_all(socket: &mut TcpSocket<'_>, mut bytes: &[u8]) -> Result<(), TcpError> {
    while !bytes.is_empty() {
        let n = socket.write(bytes).await?;
        if n == 0 {
            return Err(TcpError::ConnectionReset);
        }
        bytes = &bytes[n..];
    }
    Ok(())
}

/// Read until the blank line ending the request head, or until the buffer
/// is full. Only the request line is routed on, so truncation is harmless.
async fn read_head(socket: &mut TcpSocket<'_>, buffer: &mut [u8]) -> Result<usize, TcpError> {
    let mut len = 0;
    while len < buffer.len() {
        let n = socket.read(&mut buffer[len..]).await?;
        if n == 0 {
            break;
        }
        len += n;
        if buffer[..len].windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    Ok(len)
}
