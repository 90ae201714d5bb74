use std::fs::File;
use std::io::{BufWriter, Write};
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::time::{Duration, SystemTime};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use static_route::bind_server;
use static_route::handler::{static_file, FileHandler, FileOptions};
use static_route::router::builder::{build_router, DefineSingleRoute, DrawRoutes};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::runtime::{self, Runtime};

// (route prefix, buffer size)
const BUFFERS: [(&str, Option<usize>); 2] = [("default", None), ("128k", Some(1 << 17))];

struct BenchServer {
    runtime: Runtime,
    addr: SocketAddr,
    #[allow(dead_code)]
    tmp: TempDir,
    // sizes of test files
    sizes: Vec<u64>,
}

impl BenchServer {
    fn new() -> anyhow::Result<Self> {
        let tmp = TempDir::new()?;
        let sizes: Vec<u64> = [10, 17, 24]
            .iter()
            .filter_map(|sz| mk_tmp(&tmp, 1 << sz).ok())
            .collect();

        let default_files = FileHandler::new(tmp.path())?;
        let large_buffer_files = FileHandler::new(
            FileOptions::new(tmp.path())
                .with_buffer_size(1 << 17)
                .build(),
        )?;

        let router = build_router(default_files, |route| {
            for size in &sizes {
                let file = format!("{}", size);
                route
                    .get(&format!("/default/{}", size))
                    .to_static(&file);
                route
                    .get(&format!("/128k/{}", size))
                    .to_new_handler(static_file(file, large_buffer_files.clone()));
            }
        });

        let runtime = runtime::Builder::new_multi_thread()
            .worker_threads(num_cpus::get())
            .thread_name("static_route-bench")
            .enable_all()
            .build()?;

        // bind manually so that the actual port is known, rather than 0
        let addr = "127.0.0.1:0"
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| anyhow::anyhow!("no local address"))?;
        let listener = runtime.block_on(TcpListener::bind(addr))?;
        let addr = listener.local_addr()?;
        runtime.spawn(bind_server(listener, router));
        std::thread::sleep(Duration::from_millis(100));

        Ok(Self {
            runtime,
            addr,
            tmp,
            sizes,
        })
    }
}

fn mk_tmp(tmp: &TempDir, size: u64) -> anyhow::Result<u64> {
    let filename = tmp.path().join(format!("{}", size));
    let file = File::create(filename)?;
    let mut w = BufWriter::with_capacity(2 << 16, file);
    // pseudo random data: time stamp as bytes
    let ts_data = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)?
        .as_nanos()
        .to_le_bytes();
    for _ in (0..size).step_by(ts_data.len()) {
        w.write_all(&ts_data)?;
    }
    Ok(size)
}

pub fn static_route_benchmark(c: &mut Criterion) {
    let server = BenchServer::new().unwrap();

    let runtime = &server.runtime;
    let client = reqwest::Client::builder().build().unwrap();
    let counter = AtomicU64::new(0);
    let failed = AtomicU64::new(0);

    for file_size in &server.sizes {
        let mut group = c.benchmark_group("static_route");
        group.throughput(Throughput::Bytes(*file_size));
        for (prefix, buf_size) in &BUFFERS {
            let url = format!("http://{}/{}/{}", server.addr, prefix, file_size);
            let req = client.get(url).build().unwrap();
            group.bench_with_input(
                BenchmarkId::new(
                    "serve_static_route",
                    format!("filesize: {}, bufsize: {:?}", file_size, buf_size),
                ),
                &req,
                |b, req| {
                    b.to_async(runtime).iter(|| async {
                        let r = client.execute(req.try_clone().unwrap()).await;
                        counter.fetch_add(1, Relaxed);
                        match r {
                            Err(_) => {
                                failed.fetch_add(1, Relaxed);
                            }
                            Ok(res) => {
                                // sanity check: did we get what was expected?
                                assert_eq!(res.content_length().unwrap(), *file_size);
                                let _ = res.bytes().await.unwrap();
                            }
                        }
                    });
                },
            );
        }
    }
    println!("Errors {}/{}", failed.load(Relaxed), counter.load(Relaxed));
}

criterion_group! {
    name = static_route;
    config = Criterion::default()
        .measurement_time(Duration::from_millis(10_000))
        .warm_up_time(Duration::from_millis(10));
    targets = static_route_benchmark
}

criterion_main!(static_route);
