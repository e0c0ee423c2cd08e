//! Storage-layer tests against a live Postgres instance.

use ftdb_db::{
    ImageFilters, NewProduct, Page, ProductFilters, TrendFilters, VerticalFilters,
};
use rust_decimal::Decimal;
use sqlx::PgPool;

async fn seed_category(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("INSERT INTO categories (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("seed_category failed")
}

async fn seed_vertical(pool: &PgPool, category_id: i64, vertical_id: &str, geo_zone: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO verticals (vertical_id, category_id, name, geo_zone) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(vertical_id)
    .bind(category_id)
    .bind(format!("Vertical {vertical_id}"))
    .bind(geo_zone)
    .fetch_one(pool)
    .await
    .expect("seed_vertical failed")
}

async fn seed_trend(pool: &PgPool, vertical_id: i64, trend_id: &str, name: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO trends (trend_id, vertical_id, name, description) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(trend_id)
    .bind(vertical_id)
    .bind(name)
    .bind(format!("Description of {name}"))
    .fetch_one(pool)
    .await
    .expect("seed_trend failed")
}

async fn seed_image(pool: &PgPool, trend_id: i64, image_type: &str, md5: &str) {
    sqlx::query("INSERT INTO trend_images (trend_id, image_type, md5_hash) VALUES ($1, $2, $3)")
        .bind(trend_id)
        .bind(image_type)
        .bind(md5)
        .execute(pool)
        .await
        .expect("seed_image failed");
}

fn new_product(product_id: &str, trend_id: i64, name: &str) -> NewProduct {
    NewProduct {
        product_id: product_id.to_string(),
        trend_id,
        name: name.to_string(),
        product_type: None,
        description: None,
        brand: None,
        price: None,
        currency: None,
        color: None,
        size: None,
        material: None,
        gender: None,
        season: None,
        availability_status: None,
        image_url: None,
        product_url: None,
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn category_list_counts_are_derived(pool: PgPool) {
    let sneakers = seed_category(&pool, "sneakers").await;
    seed_vertical(&pool, sneakers, "sneakers:us", "US").await;
    seed_vertical(&pool, sneakers, "sneakers:eu", "EU").await;
    seed_category(&pool, "outerwear").await;

    let rows = ftdb_db::list_categories(&pool, None, Page::default())
        .await
        .expect("list_categories");
    assert_eq!(rows.len(), 2);
    // Ordered by name: outerwear before sneakers.
    assert_eq!(rows[0].name, "outerwear");
    assert_eq!(rows[0].vertical_count, 0);
    assert_eq!(rows[1].name, "sneakers");
    assert_eq!(rows[1].vertical_count, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn trend_counts_partition_by_polarity(pool: PgPool) {
    let category = seed_category(&pool, "sneakers").await;
    let vertical = seed_vertical(&pool, category, "sneakers:us", "US").await;
    let trend = seed_trend(&pool, vertical, "t1", "Chunky Soles").await;
    seed_image(&pool, trend, "positive", &"a".repeat(32)).await;
    seed_image(&pool, trend, "positive", &"b".repeat(32)).await;
    seed_image(&pool, trend, "negative", &"c".repeat(32)).await;

    let rows = ftdb_db::list_trends(&pool, TrendFilters::default(), Page::default())
        .await
        .expect("list_trends");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].image_count, 3);
    assert_eq!(rows[0].positive_image_count, 2);
    assert_eq!(rows[0].negative_image_count, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn trend_image_type_filter_narrows_counts_to_that_polarity(pool: PgPool) {
    let category = seed_category(&pool, "sneakers").await;
    let vertical = seed_vertical(&pool, category, "sneakers:us", "US").await;
    let mixed = seed_trend(&pool, vertical, "mixed", "Mixed Trend").await;
    let negative_only = seed_trend(&pool, vertical, "neg-only", "Negative Trend").await;
    seed_image(&pool, mixed, "positive", &"d".repeat(32)).await;
    seed_image(&pool, mixed, "negative", &"e".repeat(32)).await;
    seed_image(&pool, negative_only, "negative", &"f".repeat(32)).await;

    let filters = TrendFilters {
        image_type: Some("positive"),
        ..TrendFilters::default()
    };
    let rows = ftdb_db::list_trends(&pool, filters, Page::default())
        .await
        .expect("list_trends");

    // The join restriction happens before grouping, so only positive rows
    // remain to be counted.
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].trend_id, "mixed");
    assert_eq!(rows[0].image_count, 1);
    assert_eq!(rows[0].positive_image_count, 1);
    assert_eq!(rows[0].negative_image_count, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn trend_query_matches_name_or_description(pool: PgPool) {
    let category = seed_category(&pool, "sneakers").await;
    let vertical = seed_vertical(&pool, category, "sneakers:us", "US").await;
    seed_trend(&pool, vertical, "t1", "Chunky Soles").await;
    sqlx::query(
        "INSERT INTO trends (trend_id, vertical_id, name, description) \
         VALUES ('t2', $1, 'Slim Fit', 'Chunky knit fabrics')",
    )
    .bind(vertical)
    .execute(&pool)
    .await
    .expect("insert trend");
    seed_trend(&pool, vertical, "t3", "Unrelated").await;

    let filters = TrendFilters {
        query: Some("chunky"),
        ..TrendFilters::default()
    };
    let rows = ftdb_db::list_trends(&pool, filters, Page::default())
        .await
        .expect("list_trends");
    let ids: Vec<&str> = rows.iter().map(|r| r.trend_id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn vertical_filters_combine_with_and(pool: PgPool) {
    let sneakers = seed_category(&pool, "sneakers").await;
    let outerwear = seed_category(&pool, "outerwear").await;
    seed_vertical(&pool, sneakers, "sneakers:us", "US").await;
    seed_vertical(&pool, sneakers, "sneakers:eu", "EU").await;
    seed_vertical(&pool, outerwear, "outerwear:us", "US").await;

    let filters = VerticalFilters {
        geo_zone: Some("US"),
        category_id: Some(sneakers),
        ..VerticalFilters::default()
    };
    let rows = ftdb_db::list_verticals(&pool, filters, Page::default())
        .await
        .expect("list_verticals");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].vertical_id, "sneakers:us");
    assert_eq!(rows[0].category_name, "sneakers");
}

#[sqlx::test(migrations = "../../migrations")]
async fn geo_zones_are_distinct_and_sorted(pool: PgPool) {
    let category = seed_category(&pool, "zones").await;
    seed_vertical(&pool, category, "zones:a", "US").await;
    seed_vertical(&pool, category, "zones:b", "EU").await;
    seed_vertical(&pool, category, "zones:c", "US").await;

    let zones = ftdb_db::list_geo_zones(&pool).await.expect("geo zones");
    assert_eq!(zones, vec!["EU", "US"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn fulltext_search_matches_description_words(pool: PgPool) {
    let category = seed_category(&pool, "fulltext").await;
    let vertical = seed_vertical(&pool, category, "fulltext:v", "US").await;
    sqlx::query(
        "INSERT INTO trends (trend_id, vertical_id, name, description) \
         VALUES ('ft1', $1, 'Chunky Soles', 'Oversized rubber soles on retro runners'), \
                ('ft2', $1, 'Slim Fit', 'Tailored narrow silhouettes')",
    )
    .bind(vertical)
    .execute(&pool)
    .await
    .expect("insert trends");

    let rows = ftdb_db::fulltext_search(&pool, "rubber", 10)
        .await
        .expect("fulltext");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].trend_id, "ft1");

    let rows = ftdb_db::fulltext_search(&pool, "no-such-word", 10)
        .await
        .expect("fulltext");
    assert!(rows.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn keyword_search_reaches_ancestor_names(pool: PgPool) {
    let category = seed_category(&pool, "streetwear").await;
    let vertical = seed_vertical(&pool, category, "streetwear:us", "US").await;
    seed_trend(&pool, vertical, "kw1", "Plain Trend").await;

    // "streetwear" only appears on the ancestor category.
    let keywords = vec!["streetwear".to_string()];
    let rows = ftdb_db::search_trends_by_keywords(&pool, &keywords, 50)
        .await
        .expect("keyword search");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].trend_id, "kw1");

    let keywords = vec!["nothing-matches-this".to_string()];
    let rows = ftdb_db::search_trends_by_keywords(&pool, &keywords, 50)
        .await
        .expect("keyword search");
    assert!(rows.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn image_listing_filters_by_trend_and_type(pool: PgPool) {
    let category = seed_category(&pool, "images").await;
    let vertical = seed_vertical(&pool, category, "images:v", "US").await;
    let first = seed_trend(&pool, vertical, "i1", "First").await;
    let second = seed_trend(&pool, vertical, "i2", "Second").await;
    seed_image(&pool, first, "positive", &"1".repeat(32)).await;
    seed_image(&pool, first, "negative", &"2".repeat(32)).await;
    seed_image(&pool, second, "positive", &"3".repeat(32)).await;

    let filters = ImageFilters {
        trend_id: Some(first),
        image_type: Some("positive"),
    };
    let rows = ftdb_db::list_images(&pool, filters, Page::default())
        .await
        .expect("list_images");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].md5_hash, "1".repeat(32));
}

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_image_registration_is_rejected(pool: PgPool) {
    let category = seed_category(&pool, "dup-images").await;
    let vertical = seed_vertical(&pool, category, "dup:v", "US").await;
    let trend = seed_trend(&pool, vertical, "dup1", "Dup Trend").await;
    seed_image(&pool, trend, "positive", &"9".repeat(32)).await;

    // Same content with the same polarity violates the unique triple; the
    // opposite polarity does not.
    let same = sqlx::query(
        "INSERT INTO trend_images (trend_id, image_type, md5_hash) VALUES ($1, 'positive', $2)",
    )
    .bind(trend)
    .bind("9".repeat(32))
    .execute(&pool)
    .await;
    assert!(same.is_err());

    sqlx::query(
        "INSERT INTO trend_images (trend_id, image_type, md5_hash) VALUES ($1, 'negative', $2)",
    )
    .bind(trend)
    .bind("9".repeat(32))
    .execute(&pool)
    .await
    .expect("opposite polarity is a distinct registration");
}

#[sqlx::test(migrations = "../../migrations")]
async fn product_price_bounds_are_inclusive(pool: PgPool) {
    let category = seed_category(&pool, "products").await;
    let vertical = seed_vertical(&pool, category, "products:v", "US").await;
    let trend = seed_trend(&pool, vertical, "p1", "Price Trend").await;

    for (id, price) in [("low", "10.00"), ("mid", "20.00"), ("high", "30.00")] {
        let mut product = new_product(id, trend, &format!("Product {id}"));
        product.price = Some(price.parse::<Decimal>().expect("decimal"));
        ftdb_db::insert_product(&pool, &product)
            .await
            .expect("insert");
    }

    let filters = ProductFilters {
        min_price: Some(Decimal::new(1000, 2)), // 10.00
        max_price: Some(Decimal::new(2000, 2)), // 20.00
        ..ProductFilters::default()
    };
    let rows = ftdb_db::list_products(&pool, filters, Page::default())
        .await
        .expect("list_products");
    let ids: Vec<&str> = rows.iter().map(|r| r.product_id.as_str()).collect();
    assert_eq!(ids, vec!["low", "mid"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn product_defaults_apply_on_insert(pool: PgPool) {
    let category = seed_category(&pool, "defaults").await;
    let vertical = seed_vertical(&pool, category, "defaults:v", "US").await;
    let trend = seed_trend(&pool, vertical, "d1", "Default Trend").await;

    let id = ftdb_db::insert_product(&pool, &new_product("dflt", trend, "Plain Product"))
        .await
        .expect("insert");
    let row = ftdb_db::get_product(&pool, id)
        .await
        .expect("get_product")
        .expect("row exists");

    assert_eq!(row.currency, "USD");
    assert_eq!(row.gender, "unisex");
    assert_eq!(row.availability_status, "in_stock");
}

#[sqlx::test(migrations = "../../migrations")]
async fn product_exists_sees_rows_inserted_in_open_transaction(pool: PgPool) {
    let category = seed_category(&pool, "tx").await;
    let vertical = seed_vertical(&pool, category, "tx:v", "US").await;
    let trend = seed_trend(&pool, vertical, "tx1", "Tx Trend").await;

    let mut tx = pool.begin().await.expect("begin");
    assert!(!ftdb_db::product_exists(&mut *tx, "tx-product")
        .await
        .expect("exists pre-insert"));

    ftdb_db::insert_product(&mut *tx, &new_product("tx-product", trend, "Tx Product"))
        .await
        .expect("insert");

    // Read-your-own-writes inside the transaction, which is what lets bulk
    // ingestion skip a duplicate appearing later in the same batch.
    assert!(ftdb_db::product_exists(&mut *tx, "tx-product")
        .await
        .expect("exists post-insert"));

    tx.rollback().await.expect("rollback");
    assert!(!ftdb_db::product_exists(&pool, "tx-product")
        .await
        .expect("exists after rollback"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn listing_order_is_name_then_id(pool: PgPool) {
    let category = seed_category(&pool, "ordering").await;
    let vertical = seed_vertical(&pool, category, "ordering:v", "US").await;
    let trend = seed_trend(&pool, vertical, "o1", "Order Trend").await;

    // Two products with the same name; the earlier row id must come first.
    let first = ftdb_db::insert_product(&pool, &new_product("ord-a", trend, "Same Name"))
        .await
        .expect("insert");
    let second = ftdb_db::insert_product(&pool, &new_product("ord-b", trend, "Same Name"))
        .await
        .expect("insert");

    let rows = ftdb_db::list_products(&pool, ProductFilters::default(), Page::default())
        .await
        .expect("list_products");
    assert_eq!(rows[0].id, first);
    assert_eq!(rows[1].id, second);
}

#[sqlx::test(migrations = "../../migrations")]
async fn cascade_delete_removes_descendants(pool: PgPool) {
    let category = seed_category(&pool, "cascade").await;
    let vertical = seed_vertical(&pool, category, "cascade:v", "US").await;
    let trend = seed_trend(&pool, vertical, "c1", "Cascade Trend").await;
    seed_image(&pool, trend, "positive", &"8".repeat(32)).await;
    ftdb_db::insert_product(&pool, &new_product("casc", trend, "Cascade Product"))
        .await
        .expect("insert");

    sqlx::query("DELETE FROM verticals WHERE id = $1")
        .bind(vertical)
        .execute(&pool)
        .await
        .expect("delete vertical");

    let stats = ftdb_db::global_stats(&pool).await.expect("stats");
    assert_eq!(stats.total_verticals, 0);
    assert_eq!(stats.total_trends, 0);
    assert_eq!(stats.total_images, 0);
    assert_eq!(stats.total_products, 0);
    assert_eq!(stats.total_categories, 1);
}
