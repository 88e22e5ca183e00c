//! Minimal rally example: nested routers, scoped middleware and sessions.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/ping
//!   curl http://localhost:3000/users/42
//!   curl http://localhost:3000/users/me
//!   curl -X POST http://localhost:3000/users -d 'name=alice&age=30'
//!   curl -c jar -b jar http://localhost:3000/visits

use std::time::Duration;

use rally::{App, BindForm, Config, Context, Error, FormData, MemoryStore, Server, StatusCode};

#[derive(Default, serde::Serialize)]
struct NewUser {
    name: String,
    age: u8,
}

impl BindForm for NewUser {
    fn bind_form(&mut self, form: &FormData) -> Result<(), Error> {
        form.field("name", &mut self.name)?;
        form.field("age", &mut self.age)
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let config = Config::default();
    let mut app = App::with_config(&config);
    app.enable_session(MemoryStore::with_idle_timeout(Duration::from_secs(30 * 60)));

    app.root()
        .get("/ping", |ctx: &mut Context| ctx.response.text("pong"))
        .get("/visits", visits)
        .post("/users", create_user);

    let users = app.root().router("/users");
    users.middleware(|ctx: &mut Context| ctx.set("api", "users/v1"));
    users
        .get("/me", |ctx: &mut Context| ctx.response.text("you"))
        .get("/:id", get_user);

    Server::from_config(&config).serve(app).await
}

// GET /users/:id. `/users/me` is matched by the literal route above.
fn get_user(ctx: &mut Context) {
    let api = ctx.get::<&str>("api").copied().unwrap_or_default();
    let body = serde_json::json!({ "id": ctx.param("id"), "api": api });
    ctx.json(&body);
}

// POST /users with a url-encoded body. A one-segment path is a leaf of the
// root, not an index of the `/users` sub-router.
fn create_user(ctx: &mut Context) {
    let mut user = NewUser::default();
    match ctx.request.bind_form(&mut user) {
        Ok(()) => {
            ctx.response.set_status(StatusCode::CREATED);
            ctx.json(&user);
        }
        Err(e) => {
            ctx.response.set_status(StatusCode::BAD_REQUEST);
            ctx.response.text(e.to_string());
        }
    }
}

fn visits(ctx: &mut Context) {
    let count = ctx
        .session()
        .map(|session| {
            let count = session.get("visits").and_then(|v| v.as_u64()).unwrap_or(0) + 1;
            session.set("visits", count);
            count
        })
        .unwrap_or(0);
    ctx.response.text(format!("visit #{count}"));
}
