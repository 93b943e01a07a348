//! Auth and admin flows end to end.
//!
//! Requires a migrated database and a running storefront; see the crate docs.

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};

use emporium_integration_tests::{
    Shopper, TEST_PASSWORD, body, connect_db, insert_product, location,
};

/// Smallest valid GIF.
const TINY_GIF: &[u8] = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;";

fn product_form(name: &str, price: &str) -> Form {
    let image = Part::bytes(TINY_GIF)
        .file_name("pixel.gif")
        .mime_str("image/gif")
        .expect("static mime type is valid");

    Form::new()
        .text("name", name.to_string())
        .text("description", "Uploaded by an integration test")
        .text("price", price.to_string())
        .part("image", image)
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_duplicate_username_and_bad_password_are_rejected() {
    let db = connect_db().await;
    let existing = Shopper::sign_up(&db).await;
    let client = Shopper::client();

    let resp = client
        .post(format!("{}/register", existing.base_url))
        .form(&[
            ("username", existing.username.as_str()),
            ("email", "someone@example.com"),
            ("password", TEST_PASSWORD),
        ])
        .send()
        .await
        .expect("POST /register failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body(resp).await.contains("username already taken"));

    let resp = client
        .post(format!("{}/login", existing.base_url))
        .form(&[
            ("username", existing.username.as_str()),
            ("password", "wrong-password"),
        ])
        .send()
        .await
        .expect("POST /login failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body(resp).await.contains("Invalid username or password"));
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_admin_area_follows_current_admin_flag() {
    let db = connect_db().await;
    let shopper = Shopper::sign_up(&db).await;

    assert_eq!(location(&shopper.get("/admin").await), "/");

    shopper.set_admin(&db, true).await;
    assert_eq!(shopper.get("/admin").await.status(), StatusCode::OK);

    shopper.set_admin(&db, false).await;
    assert_eq!(location(&shopper.get("/admin").await), "/");
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_admin_adds_product_with_image() {
    let db = connect_db().await;
    let admin = Shopper::sign_up(&db).await;
    admin.set_admin(&db, true).await;
    let name = format!("Upload Tea {}", admin.username);

    let resp = admin
        .client
        .post(format!("{}/admin/add_product", admin.base_url))
        .multipart(product_form(&name, "7.25"))
        .send()
        .await
        .expect("POST /admin/add_product failed");
    assert_eq!(location(&resp), "/admin");

    let image_url: String =
        sqlx::query_scalar("SELECT image_url FROM shop.products WHERE name = $1")
            .bind(&name)
            .fetch_one(&db)
            .await
            .expect("product was not created");
    assert!(image_url.starts_with("uploads/"));
    assert!(image_url.ends_with("pixel.gif"));

    let image = admin.get(&format!("/static/{image_url}")).await;
    assert_eq!(image.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_admin_rejects_unsupported_image_type() {
    let db = connect_db().await;
    let admin = Shopper::sign_up(&db).await;
    admin.set_admin(&db, true).await;
    let name = format!("Script Tea {}", admin.username);

    let form = Form::new()
        .text("name", name.clone())
        .text("description", "Not an image")
        .text("price", "1.00")
        .part(
            "image",
            Part::bytes(b"#!/bin/sh".as_slice()).file_name("payload.sh"),
        );

    let resp = admin
        .client
        .post(format!("{}/admin/add_product", admin.base_url))
        .multipart(form)
        .send()
        .await
        .expect("POST /admin/add_product failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let created: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop.products WHERE name = $1")
        .bind(&name)
        .fetch_one(&db)
        .await
        .expect("count failed");
    assert_eq!(created, 0);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_ordered_product_cannot_be_deleted() {
    let db = connect_db().await;
    let admin = Shopper::sign_up(&db).await;
    admin.set_admin(&db, true).await;

    let ordered = insert_product(&db, "Ordered Tea", "5.00").await;
    let unordered = insert_product(&db, "Unordered Tea", "5.00").await;
    admin.add_to_cart(ordered).await;
    admin.checkout().await;

    let resp = admin
        .post_form(&format!("/admin/delete_product/{ordered}"), &[])
        .await;
    assert_eq!(location(&resp), "/admin");

    let resp = admin
        .post_form(&format!("/admin/delete_product/{unordered}"), &[])
        .await;
    assert_eq!(location(&resp), "/admin");

    let remaining: Vec<i32> =
        sqlx::query_scalar("SELECT id FROM shop.products WHERE id = ANY($1) ORDER BY id")
            .bind(vec![ordered.as_i32(), unordered.as_i32()])
            .fetch_all(&db)
            .await
            .expect("query failed");
    assert_eq!(remaining, vec![ordered.as_i32()]);
}
