//! Defines the file-serving collaborator used by static routes.
//!
//! A `FileHandler` is bound to the public directory and the cache policy once, at startup, and
//! then answers for any file below that directory. Both `If-None-Match` (etags) and
//! `If-Modified-Since` are supported to check file modification, single byte ranges are served
//! with `206 Partial Content`, and side-by-side compressed files for gzip and brotli are used when
//! enabled. See `FileOptions` for more details.

mod accepted_encoding;
mod range;

use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, Stream};
use futures_util::FutureExt;
use httpdate::{fmt_http_date, parse_http_date};
use hyper::header::*;
use hyper::{Body, Method, Response, StatusCode};
use log::{debug, trace};
use mime::{self, Mime};
use mime_guess::from_path;
use percent_encoding::percent_decode_str;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use self::accepted_encoding::accepted_encodings;
use self::range::ByteRange;
use crate::handler::{HandlerError, HandlerFuture};
use crate::state::{request_id, FromState, State};

use std::cmp;
use std::convert::From;
use std::fs::Metadata;
use std::io::{self, SeekFrom};
use std::panic::RefUnwindSafe;
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// Resolves a path relative to the public directory and answers the request with that file.
///
/// This is the seam between a `StaticRoute` and whatever serves the bytes. `FileHandler` is the
/// implementation used in applications; tests can substitute their own.
pub trait ServeFile: Send + Sync + RefUnwindSafe {
    /// Responds to the request in `state` with the file at `path`, relative to the public root.
    ///
    /// The path of the request itself is ignored.
    fn serve(&self, path: &str, state: State) -> Pin<Box<HandlerFuture>>;
}

/// Options to pass to a `FileHandler`.
/// Allows overriding default behaviour for compression, cache control headers, etc.
///
/// `FileOptions` implements `From` for `String` and `PathBuf` (and related reference types) - so
/// that a path can be passed to `FileHandler::new` if only default options are required.
///
/// For overridding default options, `FileOptions` provides builder methods. The default
/// values and use of the builder methods are shown in the example below.
///
/// ```rust
/// use static_route::handler::FileOptions;
///
/// let default_options = FileOptions::from("my_static_path");
/// let from_builder = FileOptions::new("my_static_path")
///     .with_cache_control("public")
///     .with_gzip(false)
///     .with_brotli(false)
///     .build();
///
/// assert_eq!(default_options, from_builder);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FileOptions {
    root: PathBuf,
    cache_control: String,
    gzip: bool,
    brotli: bool,
    buffer_size: Option<usize>,
}

impl FileOptions {
    /// Create a new `FileOptions` for the given public directory, with default values.
    pub fn new<P: AsRef<Path>>(root: P) -> Self
    where
        PathBuf: From<P>,
    {
        FileOptions {
            root: PathBuf::from(root),
            cache_control: "public".to_string(),
            gzip: false,
            brotli: false,
            buffer_size: None,
        }
    }

    /// Sets the "cache_control" header in static file responses to the given value.
    pub fn with_cache_control(&mut self, cache_control: &str) -> &mut Self {
        self.cache_control = cache_control.to_owned();
        self
    }

    /// If `true`, given a request for FILE, serves FILE.gz if it exists in the static directory and
    /// if the accept-encoding header is set to allow gzipped content (defaults to false).
    pub fn with_gzip(&mut self, gzip: bool) -> &mut Self {
        self.gzip = gzip;
        self
    }

    /// If `true`, given a request for FILE, serves FILE.br if it exists in the static directory and
    /// if the accept-encoding header is set to allow brotli content (defaults to false).
    pub fn with_brotli(&mut self, brotli: bool) -> &mut Self {
        self.brotli = brotli;
        self
    }

    /// Sets the maximum buffer size to be used when serving the file.
    /// If unset, the default maximum buffer size corresponding to file system block size will be
    /// used.
    pub fn with_buffer_size(&mut self, buf_sz: usize) -> &mut Self {
        self.buffer_size = Some(buf_sz);
        self
    }

    /// Clones `self` to return an owned value for passing to a handler.
    pub fn build(&mut self) -> Self {
        self.clone()
    }

    /// The public directory files are served from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The value sent in the `Cache-Control` header.
    pub fn cache_control(&self) -> &str {
        &self.cache_control
    }

    fn compression_enabled(&self) -> bool {
        self.gzip || self.brotli
    }
}

/// Create a `FileOptions` from various types, used by `FileHandler::new` which has a constraint
/// `FileOptions: From<P>` for default options.
macro_rules! derive_from {
    ($type:ty) => {
        impl<'a> From<$type> for FileOptions {
            fn from(t: $type) -> FileOptions {
                FileOptions::new(t)
            }
        }
    };
}

derive_from!(&'a Path);
derive_from!(PathBuf);
derive_from!(&'a str);
derive_from!(&'a String);
derive_from!(String);

/// Raised when the public directory can't be used to serve files.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The public directory doesn't exist or can't be read.
    #[error("public directory {path:?} is not accessible: {source}")]
    Inaccessible {
        /// The configured directory.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The configured public directory is a file.
    #[error("public directory {0:?} is not a directory")]
    NotADirectory(PathBuf),
}

/// Serves files below a public directory, with a fixed cache policy.
///
/// Cloning is cheap; every clone shares the same options.
#[derive(Clone, Debug)]
pub struct FileHandler {
    options: Arc<FileOptions>,
}

impl FileHandler {
    /// Create a new `FileHandler` for the given public directory.
    ///
    /// The directory must exist; the files below it are only looked up when requested.
    pub fn new<P>(options: P) -> Result<FileHandler, AssetError>
    where
        FileOptions: From<P>,
    {
        let mut options = FileOptions::from(options);

        let root = options
            .root
            .canonicalize()
            .map_err(|source| AssetError::Inaccessible {
                path: options.root.clone(),
                source,
            })?;

        if !root.is_dir() {
            return Err(AssetError::NotADirectory(options.root));
        }

        debug!(" serving static files from {:?}", root);
        options.root = root;

        Ok(FileHandler {
            options: Arc::new(options),
        })
    }

    /// The options this handler was created with. `root` is the canonical public directory.
    pub fn options(&self) -> &FileOptions {
        &self.options
    }
}

impl ServeFile for FileHandler {
    fn serve(&self, path: &str, state: State) -> Pin<Box<HandlerFuture>> {
        create_file_response(self.options.clone(), path.to_owned(), state)
    }
}

// Creates the `HandlerFuture` response for `path` based on the given `FileOptions`.
fn create_file_response(
    options: Arc<FileOptions>,
    path: String,
    state: State,
) -> Pin<Box<HandlerFuture>> {
    async move {
        let method = Method::borrow_from(&state).clone();
        if method != Method::GET && method != Method::HEAD {
            let status = if method == Method::OPTIONS {
                StatusCode::OK
            } else {
                StatusCode::METHOD_NOT_ALLOWED
            };
            trace!("[{}] {} answered with {}", request_id(&state), method, status);
            return Ok((state, allow_response(status)));
        }

        let headers = HeaderMap::borrow_from(&state).clone();
        match file_response(&options, &path, &method, &headers).await {
            Ok(response) => {
                trace!(
                    "[{}] serving {:?} with {}",
                    request_id(&state),
                    path,
                    response.status()
                );
                Ok((state, response))
            }
            Err(err) => {
                let status = error_status(&err);
                debug!(
                    "[{}] unable to serve {:?}: {}",
                    request_id(&state),
                    path,
                    err
                );
                Err((state, HandlerError::from(err).with_status(status)))
            }
        }
    }
    .boxed()
}

async fn file_response(
    options: &FileOptions,
    path: &str,
    method: &Method,
    headers: &HeaderMap,
) -> io::Result<Response<Body>> {
    let path = resolve_path(&options.root, path)?;
    let mime_type = mime_for_path(&path);

    let (path, encoding) = check_compressed_options(options, &path, headers).await;

    let canonical = tokio::fs::canonicalize(&path)
        .await
        .map_err(unresolvable)?;
    if !canonical.starts_with(&options.root) {
        return Err(not_found("path resolves outside of the public directory"));
    }

    let mut file = File::open(&canonical).await?;
    let meta = file.metadata().await?;
    if meta.is_dir() {
        return Err(not_found("path is a directory"));
    }

    let mut response = Response::builder()
        .header(CACHE_CONTROL, options.cache_control.as_str())
        .header(ACCEPT_RANGES, "bytes");

    if options.compression_enabled() {
        response = response.header(VARY, "accept-encoding");
    }
    if let Some(etag) = entity_tag(&meta) {
        response = response.header(ETAG, etag);
    }
    if let Ok(modified) = meta.modified() {
        response = response.header(LAST_MODIFIED, fmt_http_date(modified));
    }

    if not_modified(&meta, headers) {
        return build(response.status(StatusCode::NOT_MODIFIED), Body::empty());
    }

    response = response.header(CONTENT_TYPE, mime_type.as_ref());
    if let Some(content_encoding) = encoding {
        response = response.header(CONTENT_ENCODING, content_encoding);
    }

    let len = meta.len();
    let range = if if_range_matches(&meta, headers) {
        ByteRange::parse(headers.get(RANGE), len)
    } else {
        ByteRange::Full
    };

    let (status, start, count) = match range {
        ByteRange::Full => (StatusCode::OK, 0, len),
        ByteRange::Partial { start, end } => {
            response = response.header(CONTENT_RANGE, format!("bytes {}-{}/{}", start, end, len));
            (StatusCode::PARTIAL_CONTENT, start, end - start + 1)
        }
        ByteRange::Unsatisfiable => {
            response = response.header(CONTENT_RANGE, format!("bytes */{}", len));
            return build(
                response.status(StatusCode::RANGE_NOT_SATISFIABLE),
                Body::empty(),
            );
        }
    };

    response = response
        .status(status)
        .header(CONTENT_LENGTH, count);

    if *method == Method::HEAD {
        return build(response, Body::empty());
    }

    if start > 0 {
        file.seek(SeekFrom::Start(start)).await?;
    }

    let buf_size = options
        .buffer_size
        .unwrap_or_else(|| optimal_buf_size(&meta));
    let body = Body::wrap_stream(file_stream(file, buf_size, count));

    build(response, body)
}

fn build(builder: hyper::http::response::Builder, body: Body) -> io::Result<Response<Body>> {
    builder
        .body(body)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))
}

fn allow_response(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    response
}

fn error_status(e: &io::Error) -> StatusCode {
    match e.kind() {
        io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
        io::ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn not_found(reason: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, reason)
}

// A path that can't be resolved names no file, whatever the OS reported: a component that is a
// regular file, or a name too long for the filesystem. Only permission failures stay distinct.
fn unresolvable(err: io::Error) -> io::Error {
    match err.kind() {
        io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound => err,
        _ => io::Error::new(io::ErrorKind::NotFound, err),
    }
}

// Joins the percent-decoded `path` onto the public `root`. Anything that would climb out of the
// root is refused before the filesystem is touched.
fn resolve_path(root: &Path, path: &str) -> io::Result<PathBuf> {
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map_err(|_| not_found("path is not valid UTF-8"))?;

    if decoded.contains('\0') {
        return Err(not_found("path contains a NUL byte"));
    }

    let mut resolved = root.to_path_buf();
    for component in Path::new(decoded.as_ref()).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir | Component::RootDir => {}
            Component::ParentDir | Component::Prefix(_) => {
                return Err(not_found("path escapes the public directory"))
            }
        }
    }

    if resolved == root {
        return Err(not_found("path is the public directory"));
    }

    Ok(resolved)
}

// Checks for existence of compressed files if `FileOptions` and
// "Accept-Encoding" headers allow. Returns the final path to read,
// along with an optional encoding to return as the "Content-Encoding".
async fn check_compressed_options(
    options: &FileOptions,
    path: &Path,
    headers: &HeaderMap,
) -> (PathBuf, Option<String>) {
    if !options.compression_enabled() {
        return (path.to_path_buf(), None);
    }

    let filename = match path.file_name() {
        Some(filename) => filename.to_string_lossy().into_owned(),
        None => return (path.to_path_buf(), None),
    };

    for accepted in accepted_encodings(headers) {
        if let Some(ext) = get_extension(&accepted.encoding, options) {
            let compressed = path.with_file_name(format!("{}.{}", filename, ext));
            let is_file = tokio::fs::metadata(&compressed)
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false);

            if is_file {
                return (compressed, Some(accepted.encoding));
            }
        }
    }

    (path.to_path_buf(), None)
}

// Gets the file extension for the compressed version of a file
// for a given encoding, if allowed by `FileOptions`.
fn get_extension(encoding: &str, options: &FileOptions) -> Option<&'static str> {
    match encoding {
        "gzip" if options.gzip => Some("gz"),
        "br" if options.brotli => Some("br"),
        _ => None,
    }
}

fn mime_for_path(path: &Path) -> Mime {
    from_path(path).first_or_octet_stream()
}

fn unix_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

// Checks whether a file is modified based on metadata and request headers.
fn not_modified(metadata: &Metadata, headers: &HeaderMap) -> bool {
    // If-None-Match header takes precedence over If-Modified-Since
    if headers.contains_key(IF_NONE_MATCH) {
        let etag = match entity_tag(metadata) {
            Some(etag) => etag,
            None => return false,
        };

        return headers
            .get_all(IF_NONE_MATCH)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .any(|candidate| candidate == "*" || weak_eq(candidate, &etag));
    }

    headers
        .get(IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| parse_http_date(v).ok())
        .and_then(|if_modified_time| {
            let modified = metadata.modified().ok().and_then(unix_secs)?;
            Some(modified <= unix_secs(if_modified_time)?)
        })
        .unwrap_or(false)
}

// `If-Range` only allows a partial response when the validator still matches. Our etags are weak
// and so never qualify; a date must equal `Last-Modified` exactly.
fn if_range_matches(metadata: &Metadata, headers: &HeaderMap) -> bool {
    let value = match headers.get(IF_RANGE).and_then(|v| v.to_str().ok()) {
        Some(value) => value.trim(),
        None => return true,
    };

    if value.starts_with("W/") || value.starts_with('"') {
        return false;
    }

    match (
        parse_http_date(value).ok().and_then(unix_secs),
        metadata.modified().ok().and_then(unix_secs),
    ) {
        (Some(since), Some(modified)) => since == modified,
        _ => false,
    }
}

fn weak_eq(a: &str, b: &str) -> bool {
    a.trim_start_matches("W/") == b.trim_start_matches("W/")
}

fn entity_tag(metadata: &Metadata) -> Option<String> {
    metadata.modified().ok().and_then(|modified| {
        modified.duration_since(UNIX_EPOCH).ok().map(|duration| {
            format!(
                "W/\"{0:x}-{1:x}.{2:x}\"",
                metadata.len(),
                duration.as_secs(),
                duration.subsec_nanos()
            )
        })
    })
}

// Streams `len` bytes from the current position of `file`, one buffer at a time.
fn file_stream(
    file: File,
    buf_size: usize,
    len: u64,
) -> impl Stream<Item = Result<Bytes, io::Error>> + Send {
    let buf_size = cmp::max(buf_size, 1);

    stream::try_unfold((file, len), move |(mut file, remaining)| async move {
        if remaining == 0 {
            return Ok::<_, io::Error>(None);
        }

        let mut buf = BytesMut::with_capacity(cmp::min(buf_size as u64, remaining) as usize);
        let n = file.read_buf(&mut buf).await.map_err(|err| {
            debug!("file read error: {}", err);
            err
        })? as u64;

        if n == 0 {
            debug!("file read found EOF before expected length");
            return Ok(None);
        }

        let mut chunk = buf.freeze();
        let remaining = if n > remaining {
            chunk.truncate(remaining as usize);
            0
        } else {
            remaining - n
        };

        Ok(Some((chunk, (file, remaining))))
    })
}

fn optimal_buf_size(metadata: &Metadata) -> usize {
    let block_size = get_block_size(metadata);

    // If file length is smaller than block size, don't waste space
    // reserving a bigger-than-needed buffer.
    cmp::min(block_size as u64, metadata.len()) as usize
}

#[cfg(unix)]
fn get_block_size(metadata: &Metadata) -> usize {
    use std::os::unix::fs::MetadataExt;
    metadata.blksize() as usize
}

#[cfg(not(unix))]
fn get_block_size(_metadata: &Metadata) -> usize {
    8_192
}
