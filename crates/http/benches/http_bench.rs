use criterion::{Criterion, criterion_group, criterion_main};
use http::Response;
use http::header::TRANSFER_ENCODING;
use micro_http_conn::{
    codec::body::PayloadDecoder,
    config::Http1Config,
    connection::HttpConnection,
    io::{ContentInputStream, Endpoint, SessionInputBuffer},
    protocol::{PayloadSize, Timeout},
};
use std::hint::black_box;
use std::io::{self, Cursor, Read, Write};
use std::net::SocketAddr;

// In-memory endpoint for benchmarking
struct MemoryEndpoint {
    read_data: Cursor<Vec<u8>>,
    write_data: Vec<u8>,
}

impl MemoryEndpoint {
    fn new(read_data: Vec<u8>) -> Self {
        Self { read_data: Cursor::new(read_data), write_data: Vec::new() }
    }
}

impl Read for MemoryEndpoint {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_data.read(buf)
    }
}

impl Write for MemoryEndpoint {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Endpoint for MemoryEndpoint {
    fn local_addr(&self) -> io::Result<SocketAddr> {
        Err(io::ErrorKind::Unsupported.into())
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        Err(io::ErrorKind::Unsupported.into())
    }

    fn so_timeout(&self) -> io::Result<Timeout> {
        Ok(Timeout::DISABLED)
    }

    fn set_so_timeout(&self, _timeout: Timeout) -> io::Result<()> {
        Ok(())
    }

    fn shutdown_input(&self) -> io::Result<()> {
        Ok(())
    }

    fn shutdown_output(&self) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn chunked_body(chunks: usize, chunk: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    for _ in 0..chunks {
        body.extend_from_slice(format!("{:X}\r\n", chunk.len()).as_bytes());
        body.extend_from_slice(chunk);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(b"0\r\n\r\n");
    body
}

fn bench_length_decoder(c: &mut Criterion) {
    let body = vec![b'x'; 64 * 1024];

    c.bench_function("decode_length_delimited_body", |b| {
        b.iter(|| {
            let mut source = Cursor::new(&body[..]);
            let mut buffer = SessionInputBuffer::new(8 * 1024);
            let mut content = ContentInputStream::new(PayloadDecoder::fix_length(body.len() as u64), &mut buffer, &mut source);
            black_box(content.skip_body().unwrap());
        });
    });
}

fn bench_chunked_decoder(c: &mut Criterion) {
    let body = chunked_body(64, &[b'x'; 1024]);

    c.bench_function("decode_chunked_body", |b| {
        b.iter(|| {
            let mut source = Cursor::new(&body[..]);
            let mut buffer = SessionInputBuffer::new(8 * 1024);
            let mut content = ContentInputStream::new(PayloadDecoder::chunked(), &mut buffer, &mut source);
            black_box(content.skip_body().unwrap());
        });
    });
}

fn bench_http_connection(c: &mut Criterion) {
    let body = chunked_body(16, b"Hello World!");
    let message = Response::builder().header(TRANSFER_ENCODING, "chunked").body(()).unwrap();

    c.bench_function("connection_round_trip", |b| {
        b.iter(|| {
            let mut connection = HttpConnection::new(Http1Config::default());
            connection.bind(MemoryEndpoint::new(body.clone())).unwrap();

            let mut received = Vec::new();
            connection.receive_entity(&message).unwrap().read_to_end(&mut received).unwrap();

            let mut content = connection.send_content(PayloadSize::Chunked).unwrap();
            content.write_all(&received).unwrap();
            content.finish().unwrap();

            black_box(connection.is_stale());
            connection.close().unwrap();
        });
    });
}

criterion_group!(benches, bench_length_decoder, bench_chunked_decoder, bench_http_connection);
criterion_main!(benches);
