//! Serves the same single page app shell from `/login` and `/register`, each a named route.
//!
//! Run from this directory, optionally passing the path of an asset configuration file:
//!
//! ```text
//! cargo run -- assets.toml
//! ```
use log::info;
use static_route::config::AssetConfig;
use static_route::router::builder::{build_router, DefineSingleRoute, DrawRoutes};
use static_route::router::Router;

fn router(config: &AssetConfig) -> static_route::anyhow::Result<Router> {
    let files = config.file_handler()?;

    Ok(build_router(files, |route| {
        route.get_or_head("/").name("root").to_static("index.html");
        route.get_or_head("/login").name("login").to_static("index.html");
        route
            .get_or_head("/register")
            .name("register")
            .to_static("index.html");
    }))
}

pub fn main() -> static_route::anyhow::Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => AssetConfig::load(path)?,
        None => AssetConfig::default(),
    };

    let router = router(&config)?;
    print!("{}", router.route_table());

    let addr = "127.0.0.1:7878";
    info!("serving {:?} at http://{}", config.public_dir, addr);
    println!(
        "Listening for requests at http://{}{}",
        addr,
        router.path_for("login", &[])?
    );

    static_route::start(addr, router)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use static_route::hyper::StatusCode;
    use static_route::test::TestServer;

    #[test]
    fn login_and_register_share_the_shell() {
        let router = router(&AssetConfig::load("assets.toml").unwrap()).unwrap();
        let test_server = TestServer::new(router).unwrap();

        let login = test_server
            .client()
            .get("http://localhost/login")
            .perform()
            .unwrap();
        assert_eq!(login.status(), StatusCode::OK);
        let login = login.read_utf8_body().unwrap();

        let register = test_server
            .client()
            .get("http://localhost/register")
            .perform()
            .unwrap()
            .read_utf8_body()
            .unwrap();

        assert!(login.contains("<div id=\"app\">"));
        assert_eq!(login, register);
    }
}
