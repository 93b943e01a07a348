//! Cart behavior end to end.
//!
//! Requires a migrated database and a running storefront; see the crate docs.

use reqwest::StatusCode;

use emporium_integration_tests::{Shopper, body, connect_db, insert_product, location};

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_cart_requires_login() {
    let client = Shopper::client();
    let base_url = emporium_integration_tests::storefront_url();

    let resp = client
        .get(format!("{base_url}/cart"))
        .send()
        .await
        .expect("GET /cart failed");
    assert_eq!(location(&resp), "/login?next=%2Fcart");
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_adding_same_product_merges_lines() {
    let db = connect_db().await;
    let shopper = Shopper::sign_up(&db).await;
    let tea = insert_product(&db, "Merge Tea", "4.20").await;
    let cup = insert_product(&db, "Merge Cup", "9.00").await;

    for product in [tea, tea, cup, tea] {
        let resp = shopper.add_to_cart(product).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    }

    let rows = shopper.cart_rows(&db).await;
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().any(|&(_, p, q)| p == tea && q == 3));
    assert!(rows.iter().any(|&(_, p, q)| p == cup && q == 1));

    let page = body(shopper.get("/cart").await).await;
    assert!(page.contains("Merge Tea"));
    // 3 x 4.20 + 9.00
    assert!(page.contains("21.60"));
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_adding_missing_product_is_not_found() {
    let db = connect_db().await;
    let shopper = Shopper::sign_up(&db).await;

    let resp = shopper
        .post_form("/add_to_cart/2147483647", &[])
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(shopper.cart_rows(&db).await.is_empty());
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_update_quantity_sets_and_removes() {
    let db = connect_db().await;
    let shopper = Shopper::sign_up(&db).await;
    let product = insert_product(&db, "Quantity Tea", "2.00").await;
    shopper.add_to_cart(product).await;

    let (item_id, _, _) = shopper.cart_rows(&db).await[0];
    let path = format!("/update_cart/{item_id}");

    let resp = shopper.post_form(&path, &[("quantity", "5")]).await;
    assert_eq!(location(&resp), "/cart");
    assert_eq!(shopper.cart_rows(&db).await[0].2, 5);

    let resp = shopper.post_form(&path, &[("quantity", "many")]).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(shopper.cart_rows(&db).await[0].2, 5);

    let resp = shopper.post_form(&path, &[("quantity", "0")]).await;
    assert_eq!(location(&resp), "/cart");
    assert!(shopper.cart_rows(&db).await.is_empty());
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_line_quantity_is_capped() {
    let db = connect_db().await;
    let shopper = Shopper::sign_up(&db).await;
    let product = insert_product(&db, "Bulk Tea", "1.00").await;
    shopper.add_to_cart(product).await;

    let (item_id, _, _) = shopper.cart_rows(&db).await[0];
    let path = format!("/update_cart/{item_id}");

    for quantity in ["1000", "200000000", "99999999999"] {
        let resp = shopper.post_form(&path, &[("quantity", quantity)]).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(shopper.cart_rows(&db).await[0].2, 1);
    }

    let resp = shopper.post_form(&path, &[("quantity", "999")]).await;
    assert_eq!(location(&resp), "/cart");

    // adding to a full line leaves it full
    let resp = shopper.add_to_cart(product).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(shopper.cart_rows(&db).await[0].2, 999);

    sqlx::query("UPDATE shop.cart_items SET quantity = 998 WHERE id = $1")
        .bind(item_id)
        .execute(&db)
        .await
        .expect("Failed to set quantity");
    shopper.add_to_cart(product).await;
    shopper.add_to_cart(product).await;
    assert_eq!(shopper.cart_rows(&db).await[0].2, 999);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_cart_items_are_private_to_their_owner() {
    let db = connect_db().await;
    let owner = Shopper::sign_up(&db).await;
    let intruder = Shopper::sign_up(&db).await;
    let product = insert_product(&db, "Private Tea", "3.00").await;
    owner.add_to_cart(product).await;
    let (item_id, _, _) = owner.cart_rows(&db).await[0];

    let resp = intruder
        .post_form(&format!("/update_cart/{item_id}"), &[("quantity", "9")])
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Removing someone else's line is a silent no-op
    let resp = intruder.get(&format!("/remove_from_cart/{item_id}")).await;
    assert_eq!(location(&resp), "/cart");

    assert_eq!(owner.cart_rows(&db).await[0].2, 1);

    let resp = intruder.get("/remove_from_cart/2147483647").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
