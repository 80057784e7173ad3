use sqlx::PgPool;

use crate::{
    error::Result,
    models::{NewProduct, Product},
};

pub async fn find_all(pool: &PgPool) -> Result<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>("SELECT * FROM produtos ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(products)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM produtos WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(product)
}

pub async fn create_product(pool: &PgPool, req: &NewProduct) -> Result<Product> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO produtos (nome, preco, estoque, descricao)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(&req.nome)
    .bind(req.preco)
    .bind(req.estoque)
    .bind(&req.descricao)
    .fetch_one(pool)
    .await?;

    Ok(product)
}

pub async fn update_product(pool: &PgPool, id: i64, req: &NewProduct) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE produtos
        SET
            nome = $1,
            preco = $2,
            estoque = $3,
            descricao = $4
        WHERE id = $5
        RETURNING *
        "#,
    )
    .bind(&req.nome)
    .bind(req.preco)
    .bind(req.estoque)
    .bind(&req.descricao)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

pub async fn delete_product(pool: &PgPool, id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM produtos WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
