//! In-process storefront backend for the client tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use matchit::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const TOKEN: &str = "tok-1";
pub const PASSWORD: &str = "secret";

/// One request as the backend saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone)]
struct Line {
    cart_item_id: u64,
    product_id: u64,
    quantity: u32,
}

struct Product {
    id: u64,
    name: &'static str,
    price: f64,
    stock: u32,
}

const CATALOG: &[Product] = &[
    Product {
        id: 1,
        name: "Desk Lamp",
        price: 25.0,
        stock: 3,
    },
    Product {
        id: 2,
        name: "Oak Desk",
        price: 120.0,
        stock: 5,
    },
];

#[derive(Default)]
pub struct State {
    pub requests: Vec<Recorded>,
    /// Canned responses served before any routing
    pub overrides: VecDeque<(StatusCode, String)>,
    /// Replaces the normal sign-in response
    pub auth_body: Option<Value>,
    lines: Vec<Line>,
    next_item_id: u64,
}

impl State {
    pub fn respond_next(&mut self, status: StatusCode, body: impl Into<String>) {
        self.overrides.push_back((status, body.into()));
    }

    pub fn last(&self) -> &Recorded {
        self.requests.last().expect("no request recorded")
    }

    pub fn find(&self, method: Method, path: &str) -> Option<&Recorded> {
        self.requests.iter().find(|r| r.method == method && r.path == path)
    }

    fn cart(&self) -> Value {
        let items: Vec<Value> = self
            .lines
            .iter()
            .map(|line| {
                let product = product(line.product_id);
                json!({
                    "cartItemId": line.cart_item_id,
                    "productId": line.product_id,
                    "productName": product.name,
                    "productDescription": "",
                    "productImageUrl": null,
                    "quantity": line.quantity,
                    "priceAtAddition": product.price,
                    "subtotal": product.price * line.quantity as f64,
                    "maxStock": product.stock,
                })
            })
            .collect();
        let total_items: u32 = self.lines.iter().map(|l| l.quantity).sum();
        let total_price: f64 = self
            .lines
            .iter()
            .map(|l| product(l.product_id).price * l.quantity as f64)
            .sum();
        json!({
            "cartId": 7,
            "userId": 1,
            "userEmail": "ana@example.com",
            "items": items,
            "totalItems": total_items,
            "totalPrice": total_price,
        })
    }
}

fn product(id: u64) -> &'static Product {
    CATALOG.iter().find(|p| p.id == id).expect("unknown product")
}

pub fn user_json() -> Value {
    json!({
        "id": 1,
        "fullName": "Ana Lima",
        "email": "ana@example.com",
        "role": "USER",
        "isActive": 1,
        "isNotLocked": true,
    })
}

/// Handle to a running backend
#[derive(Clone)]
pub struct MockBackend {
    pub base_url: String,
    state: Arc<Mutex<State>>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(State {
            next_item_id: 100,
            ..State::default()
        }));
        let router = Arc::new(build_router());

        let server_state = Arc::clone(&state);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let io = TokioIo::new(stream);
                let state = Arc::clone(&server_state);
                let router = Arc::clone(&router);

                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        let router = Arc::clone(&router);
                        handle_request(req, state, router)
                    });
                    let _ = http1::Builder::new().serve_connection(io, service).await;
                });
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

#[derive(Clone, Copy)]
enum Route {
    Authenticate,
    ForgotPassword,
    Cart,
    CartAdd,
    CartItem,
    CartClear,
    ProductSearch,
    UserSearch,
}

fn build_router() -> Router<Route> {
    let mut router = Router::new();
    router.insert("/api/auth/authenticate", Route::Authenticate).unwrap();
    router.insert("/api/auth/forgot-password", Route::ForgotPassword).unwrap();
    router.insert("/api/cart", Route::Cart).unwrap();
    router.insert("/api/cart/add", Route::CartAdd).unwrap();
    router.insert("/api/cart/items/{id}", Route::CartItem).unwrap();
    router.insert("/api/cart/clear", Route::CartClear).unwrap();
    router.insert("/api/products/search", Route::ProductSearch).unwrap();
    router.insert("/api/auth/users/search", Route::UserSearch).unwrap();
    router
}

fn reply(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(body.into()))
        .unwrap()
}

fn json_reply(status: StatusCode, value: Value) -> Response<Full<Bytes>> {
    reply(status, value.to_string())
}

async fn handle_request(
    req: Request<Incoming>,
    state: Arc<Mutex<State>>,
    router: Arc<Router<Route>>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let authorization = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = req
        .into_body()
        .collect()
        .await
        .map(|c| c.to_bytes())
        .unwrap_or_default();
    let body = String::from_utf8_lossy(&body).to_string();

    let mut state = state.lock().unwrap();
    state.requests.push(Recorded {
        method: method.clone(),
        path: path.clone(),
        query: query.clone(),
        authorization: authorization.clone(),
        body: body.clone(),
    });

    if let Some((status, body)) = state.overrides.pop_front() {
        return Ok(reply(status, body));
    }

    let Ok(matched) = router.at(&path) else {
        return Ok(json_reply(StatusCode::NOT_FOUND, json!({"message": "Not found"})));
    };
    let route = *matched.value;
    let item_id: Option<u64> = matched.params.get("id").and_then(|id| id.parse().ok());

    let public = matches!(route, Route::Authenticate | Route::ForgotPassword);
    if !public && authorization.as_deref() != Some(&format!("Bearer {}", TOKEN)) {
        return Ok(json_reply(
            StatusCode::UNAUTHORIZED,
            json!({"message": "Session expired"}),
        ));
    }

    let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);

    let response = match (method, route) {
        (Method::POST, Route::Authenticate) => {
            if body["password"] != PASSWORD {
                json_reply(StatusCode::UNAUTHORIZED, json!({"message": "Bad credentials"}))
            } else if let Some(custom) = state.auth_body.clone() {
                json_reply(StatusCode::OK, custom)
            } else {
                json_reply(
                    StatusCode::OK,
                    json!({
                        "accessToken": TOKEN,
                        "refreshToken": "refresh-1",
                        "user": user_json(),
                    }),
                )
            }
        }

        (Method::POST, Route::ForgotPassword) => {
            json_reply(StatusCode::OK, json!({"message": "Reset link sent"}))
        }

        (Method::GET, Route::Cart) => json_reply(StatusCode::OK, state.cart()),

        (Method::POST, Route::CartAdd) => {
            let product_id = body["productId"].as_u64().unwrap_or_default();
            let quantity = body["quantity"].as_u64().unwrap_or_default() as u32;
            let stock = product(product_id).stock;
            let existing = state
                .lines
                .iter()
                .position(|l| l.product_id == product_id);
            let current = existing.map(|i| state.lines[i].quantity).unwrap_or(0);
            if current + quantity > stock {
                json_reply(
                    StatusCode::BAD_REQUEST,
                    json!({"message": format!("Insufficient stock. Available: {}", stock)}),
                )
            } else {
                match existing {
                    Some(i) => state.lines[i].quantity += quantity,
                    None => {
                        let cart_item_id = state.next_item_id;
                        state.next_item_id += 1;
                        state.lines.push(Line {
                            cart_item_id,
                            product_id,
                            quantity,
                        });
                    }
                }
                json_reply(StatusCode::OK, state.cart())
            }
        }

        (Method::PUT, Route::CartItem) => {
            let quantity = body["quantity"].as_u64().unwrap_or_default() as u32;
            match state.lines.iter().position(|l| Some(l.cart_item_id) == item_id) {
                None => json_reply(StatusCode::NOT_FOUND, json!({"message": "Cart item not found"})),
                Some(i) => {
                    let stock = product(state.lines[i].product_id).stock;
                    if quantity > stock {
                        json_reply(
                            StatusCode::BAD_REQUEST,
                            json!({"message": format!("Insufficient stock. Available: {}", stock)}),
                        )
                    } else {
                        state.lines[i].quantity = quantity;
                        json_reply(StatusCode::OK, state.cart())
                    }
                }
            }
        }

        (Method::DELETE, Route::CartItem) => {
            state.lines.retain(|l| Some(l.cart_item_id) != item_id);
            json_reply(StatusCode::OK, state.cart())
        }

        (Method::DELETE, Route::CartClear) => {
            state.lines.clear();
            reply(StatusCode::OK, Bytes::new())
        }

        (Method::GET, Route::ProductSearch) => {
            let term = query_param(query.as_deref(), "term").unwrap_or_default().to_lowercase();
            let content: Vec<Value> = CATALOG
                .iter()
                .filter(|p| p.name.to_lowercase().contains(&term))
                .map(|p| {
                    json!({
                        "id": p.id,
                        "name": p.name,
                        "images": [],
                        "price": p.price,
                        "stockQuantity": p.stock,
                        "description": "",
                        "isActive": true,
                    })
                })
                .collect();
            json_reply(StatusCode::OK, page_json(content))
        }

        (Method::GET, Route::UserSearch) => {
            json_reply(StatusCode::OK, page_json(vec![user_json()]))
        }

        _ => json_reply(
            StatusCode::METHOD_NOT_ALLOWED,
            json!({"message": "Method not allowed"}),
        ),
    };

    Ok(response)
}

fn page_json(content: Vec<Value>) -> Value {
    let total = content.len();
    let total_pages = total.div_ceil(12);
    let empty = total == 0;
    json!({
        "content": content,
        "totalElements": total,
        "totalPages": total_pages,
        "number": 0,
        "size": 12,
        "numberOfElements": total,
        "first": true,
        "last": true,
        "empty": empty,
    })
}

fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    query?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| v.replace('+', " "))
    })
}
