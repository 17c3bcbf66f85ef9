//! Fetches a page over a plain TCP connection and prints its body.
//!
//! ```text
//! cargo run --example fetch -- 127.0.0.1:8080 /
//! ```

use std::error::Error;
use std::io::{Read, Write};

use http::{HeaderMap, HeaderName, HeaderValue};
use micro_http_conn::config::Http1Config;
use micro_http_conn::connection::HttpConnection;
use micro_http_conn::protocol::{PayloadSize, Timeout};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

const MAX_HEADERS: usize = 64;

fn main() -> Result<(), Box<dyn Error>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut args = std::env::args().skip(1);
    let addr = args.next().unwrap_or_else(|| "127.0.0.1:8080".to_string());
    let path = args.next().unwrap_or_else(|| "/".to_string());

    let mut connection = match HttpConnection::connect(&addr, Http1Config::default()) {
        Ok(connection) => connection,
        Err(e) => {
            error!(cause = %e, %addr, "connect failed");
            return Err(e.into());
        }
    };
    connection.set_socket_timeout(Timeout::of_millis(10_000));
    info!(%connection, timeout = %connection.socket_timeout(), "connected");

    let mut request = connection.send_content(PayloadSize::Undefined)?;
    write!(request, "GET {path} HTTP/1.1\r\nHost: {addr}\r\nAccept: */*\r\n\r\n")?;
    request.finish()?;

    let Some(head) = connection.receive_head()? else {
        warn!("server closed the connection without responding");
        return Ok(());
    };

    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut response = httparse::Response::new(&mut headers);
    response.parse(&head)?;
    info!(status = response.code, reason = response.reason, "received response");

    let mut header_map = HeaderMap::with_capacity(response.headers.len());
    for header in response.headers.iter() {
        header_map.append(HeaderName::from_bytes(header.name.as_bytes())?, HeaderValue::from_bytes(header.value)?);
    }

    let mut body = Vec::new();
    {
        let mut entity = connection.receive_entity(&header_map)?;
        info!(
            length = entity.content_length(),
            chunked = entity.is_chunked(),
            content_type = entity.content_type(),
            "reading body"
        );
        entity.read_to_end(&mut body)?;
    }
    println!("{}", String::from_utf8_lossy(&body));

    if connection.is_stale() {
        info!("server closed the connection");
    } else {
        info!("connection can be reused");
    }
    connection.close()?;
    Ok(())
}
