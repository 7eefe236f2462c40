use branch_inventory::{
    AppConfig, AppState, MemoryRepository, MemorySessionStore, create_router,
    models::{Product, ProductInput},
    repository::Repository,
};
use reqwest::{StatusCode, header, redirect::Policy};
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct TestApp {
    pub address: String,
    pub repo: Arc<MemoryRepository>,
    pub sessions: Arc<MemorySessionStore>,
    pub client: reqwest::Client,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn product(&self, name: &str, branch: &str) -> Product {
        self.repo
            .seed_product(ProductInput {
                name: name.to_string(),
                description: Some("seeded".to_string()),
                price: 5.0,
                quantity: 10,
                branch: branch.to_string(),
            })
            .await
    }

    /// Posts credentials and returns the raw response (redirects are not followed).
    async fn post_login(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/login"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .expect("login request failed")
    }

    /// Logs in and returns the `Cookie` header value to replay on later requests.
    async fn login(&self, username: &str, password: &str) -> String {
        let response = self.post_login(username, password).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn get(&self, path: &str, cookie: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header(header::COOKIE, cookie)
            .send()
            .await
            .expect("get request failed")
    }

    async fn post_form(&self, path: &str, cookie: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header(header::COOKIE, cookie)
            .form(form)
            .send()
            .await
            .expect("post request failed")
    }
}

async fn spawn_app() -> TestApp {
    let repo = Arc::new(MemoryRepository::new());
    repo.seed_user("root", "rootpw", "admin", None).await;
    repo.seed_user("mia", "miapw", "manager", Some("north")).await;
    repo.seed_user("sam", "sampw", "manager", Some("south")).await;
    let sessions = Arc::new(MemorySessionStore::new());

    let state = AppState {
        repo: repo.clone(),
        sessions: sessions.clone(),
        config: AppConfig::default(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let client = reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap();

    TestApp {
        address,
        repo,
        sessions,
        client,
    }
}

fn location(response: &reqwest::Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/health")).send().await.unwrap();

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_login_page_renders() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/login")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("name=\"password\""));
}

#[tokio::test]
async fn test_login_redirects_by_role() {
    let app = spawn_app().await;

    let admin = app.post_login("root", "rootpw").await;
    assert_eq!(location(&admin), "/admin/dashboard");

    let manager = app.post_login("mia", "miapw").await;
    assert_eq!(location(&manager), "/manager/dashboard");

    assert_eq!(app.sessions.len().await, 2);
}

#[tokio::test]
async fn test_bad_credentials_set_no_session() {
    let app = spawn_app().await;

    let response = app.post_login("mia", "nope").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(response.text().await.unwrap().contains("Invalid credentials"));
    assert!(app.sessions.is_empty().await);
}

#[tokio::test]
async fn test_index_follows_session() {
    let app = spawn_app().await;

    let anonymous = app.client.get(app.url("/")).send().await.unwrap();
    assert_eq!(location(&anonymous), "/login");

    let cookie = app.login("mia", "miapw").await;
    let signed_in = app.get("/", &cookie).await;
    assert_eq!(location(&signed_in), "/manager/dashboard");
}

#[tokio::test]
async fn test_dashboards_require_session() {
    let app = spawn_app().await;

    for path in [
        "/admin/dashboard",
        "/manager/dashboard",
        "/admin/delete-product/1",
        "/manager/delete-product/1",
    ] {
        let response = app.client.get(app.url(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), "/login", "{path}");
    }
}

#[tokio::test]
async fn test_manager_cannot_use_admin_routes() {
    let app = spawn_app().await;
    let product = app.product("Drill", "south").await;
    let cookie = app.login("mia", "miapw").await;

    let dashboard = app.get("/admin/dashboard", &cookie).await;
    assert_eq!(location(&dashboard), "/login");

    let delete = app
        .get(&format!("/admin/delete-product/{}", product.id), &cookie)
        .await;
    assert_eq!(location(&delete), "/login");

    let add = app
        .post_form(
            "/admin/add-product",
            &cookie,
            &[
                ("name", "Sneaky"),
                ("price", "1"),
                ("quantity", "1"),
                ("branch", "south"),
            ],
        )
        .await;
    assert_eq!(location(&add), "/login");

    assert_eq!(app.repo.get_all_products().await.unwrap(), vec![product]);
}

#[tokio::test]
async fn test_admin_manages_any_branch() {
    let app = spawn_app().await;
    let existing = app.product("Saw", "north").await;
    let cookie = app.login("root", "rootpw").await;

    let add = app
        .post_form(
            "/admin/add-product",
            &cookie,
            &[
                ("name", "Drill"),
                ("description", "cordless"),
                ("price", "79.5"),
                ("quantity", "3"),
                ("branch", "south"),
            ],
        )
        .await;
    assert_eq!(location(&add), "/admin/dashboard");

    let edit_form = app
        .get(&format!("/admin/edit-product/{}", existing.id), &cookie)
        .await;
    assert_eq!(edit_form.status(), StatusCode::OK);
    assert!(edit_form.text().await.unwrap().contains("Saw"));

    let update = app
        .post_form(
            &format!("/admin/edit-product/{}", existing.id),
            &cookie,
            &[
                ("name", "Saw"),
                ("price", "20"),
                ("quantity", "1"),
                ("branch", "east"),
            ],
        )
        .await;
    assert_eq!(location(&update), "/admin/dashboard");
    let moved = app.repo.get_product(existing.id).await.unwrap().unwrap();
    assert_eq!(moved.branch, "east");
    assert_eq!(moved.description, None);

    let alias = app
        .post_form(
            &format!("/admin/update-product/{}", existing.id),
            &cookie,
            &[
                ("name", "Saw"),
                ("price", "21"),
                ("quantity", "2"),
                ("branch", "east"),
            ],
        )
        .await;
    assert_eq!(location(&alias), "/admin/dashboard");
    assert_eq!(
        app.repo.get_product(existing.id).await.unwrap().unwrap().quantity,
        2
    );

    let delete = app
        .get(&format!("/admin/delete-product/{}", existing.id), &cookie)
        .await;
    assert_eq!(location(&delete), "/admin/dashboard");

    let remaining = app.repo.get_all_products().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "Drill");
    assert_eq!(remaining[0].branch, "south");

    let dashboard = app.get("/admin/dashboard", &cookie).await;
    assert_eq!(dashboard.status(), StatusCode::OK);
    assert!(dashboard.text().await.unwrap().contains("Drill"));
}

#[tokio::test]
async fn test_manager_cannot_touch_other_branch() {
    let app = spawn_app().await;
    let foreign = app.product("Screws", "south").await;
    let cookie = app.login("mia", "miapw").await;

    let update = app
        .post_form(
            &format!("/manager/update-product/{}", foreign.id),
            &cookie,
            &[("name", "Mine now"), ("price", "0"), ("quantity", "0")],
        )
        .await;
    assert_eq!(location(&update), "/manager/dashboard");

    let delete = app
        .get(&format!("/manager/delete-product/{}", foreign.id), &cookie)
        .await;
    assert_eq!(location(&delete), "/manager/dashboard");

    let edit = app
        .get(&format!("/manager/edit-product/{}", foreign.id), &cookie)
        .await;
    assert_eq!(location(&edit), "/manager/dashboard");

    assert_eq!(
        app.repo.get_product(foreign.id).await.unwrap(),
        Some(foreign)
    );
}

#[tokio::test]
async fn test_manager_manages_own_branch() {
    let app = spawn_app().await;
    let cookie = app.login("mia", "miapw").await;

    let add = app
        .post_form(
            "/manager/add-product",
            &cookie,
            &[
                ("name", "Nails"),
                ("price", "0.05"),
                ("quantity", "1000"),
                // Ignored: managers always add to their own branch.
                ("branch", "south"),
            ],
        )
        .await;
    assert_eq!(location(&add), "/manager/dashboard");

    let created = app.repo.get_products_by_branch("north").await.unwrap();
    assert_eq!(created.len(), 1);
    let id = created[0].id;

    let edit = app
        .get(&format!("/manager/edit-product/{id}"), &cookie)
        .await;
    assert_eq!(edit.status(), StatusCode::OK);

    app.post_form(
        &format!("/manager/update-product/{id}"),
        &cookie,
        &[("name", "Nails"), ("price", "0.06"), ("quantity", "900")],
    )
    .await;
    let updated = app.repo.get_product(id).await.unwrap().unwrap();
    assert_eq!(updated.quantity, 900);
    assert_eq!(updated.branch, "north");

    app.get(&format!("/manager/delete-product/{id}"), &cookie)
        .await;
    assert!(app.repo.get_product(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_manager_dashboard_partitions_branches() {
    let app = spawn_app().await;
    app.product("North hammer", "north").await;
    app.product("South hammer", "south").await;
    app.product("East hammer", "east").await;
    let cookie = app.login("sam", "sampw").await;

    let response = app.get("/manager/dashboard", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();

    let (mine, others) = body.split_once("Other branches").unwrap();
    assert!(mine.contains("South hammer"));
    assert!(!mine.contains("North hammer"));
    assert!(others.contains("North hammer"));
    assert!(others.contains("East hammer"));
    assert!(!others.contains("South hammer"));
}

#[tokio::test]
async fn test_admin_cannot_open_manager_dashboard() {
    let app = spawn_app().await;
    let cookie = app.login("root", "rootpw").await;

    let response = app.get("/manager/dashboard", &cookie).await;

    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_logout_clears_session() {
    let app = spawn_app().await;
    let cookie = app.login("root", "rootpw").await;

    let before = app.get("/admin/dashboard", &cookie).await;
    assert_eq!(before.status(), StatusCode::OK);

    let logout = app.get("/logout", &cookie).await;
    assert_eq!(location(&logout), "/login");
    assert!(
        logout.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .contains("Max-Age=0")
    );

    let after = app.get("/admin/dashboard", &cookie).await;
    assert_eq!(after.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&after), "/login");
    assert!(app.sessions.is_empty().await);
}
