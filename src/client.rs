//! Product API Client
//!
//! 小売業者の商品検索APIへの同期HTTPクライアント。
//! リクエストは1回のGETのみで、リトライ・ページング・キャッシュは行いません。

use reqwest::blocking::Client;
use serde_json::Value;

use crate::api::StatusPolicy;
use crate::error::Error;
use crate::table::Table;
use crate::types::CellValue;

/// 商品検索エンドポイント
pub const PRODUCT_SEARCH_URL: &str = "https://dev.tescolabs.com/grocery/products";

/// 商品詳細エンドポイント
pub const PRODUCT_DATA_URL: &str = "https://dev.tescolabs.com/product";

/// APIキーを渡すヘッダー名
pub const API_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// 検索結果の既定件数
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// 商品APIクライアント
///
/// ```rust,no_run
/// use xlsxlinks::{ProductClient, StatusPolicy};
///
/// # fn main() -> Result<(), xlsxlinks::Error> {
/// let client = ProductClient::new("my-api-key")?
///     .with_status_policy(StatusPolicy::Raise);
/// let results = client.product_search("semi skimmed milk", 10, 0)?;
/// let product = client.product_data("254656543")?;
/// println!("{} / {}", results, product["description"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ProductClient {
    http: Client,
    api_key: String,
    search_url: String,
    product_url: String,
    status_policy: StatusPolicy,
}

impl ProductClient {
    /// APIキーを指定してクライアントを生成する
    pub fn new(api_key: impl Into<String>) -> Result<Self, Error> {
        Ok(Self {
            http: Client::builder().build()?,
            api_key: api_key.into(),
            search_url: PRODUCT_SEARCH_URL.to_string(),
            product_url: PRODUCT_DATA_URL.to_string(),
            status_policy: StatusPolicy::default(),
        })
    }

    /// 検索エンドポイントを差し替える
    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }

    /// 商品詳細エンドポイントを差し替える
    pub fn with_product_url(mut self, url: impl Into<String>) -> Self {
        self.product_url = url.into();
        self
    }

    /// HTTPステータスの扱いを指定する
    pub fn with_status_policy(mut self, policy: StatusPolicy) -> Self {
        self.status_policy = policy;
        self
    }

    pub fn status_policy(&self) -> StatusPolicy {
        self.status_policy
    }

    /// 商品を検索し、レスポンス本文のJSONをそのまま返す
    pub fn product_search(&self, query: &str, limit: u32, offset: u32) -> Result<Value, Error> {
        self.get(
            &self.search_url,
            &[
                ("query", query.to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ],
        )
    }

    /// 商品コード（TPNC）で商品詳細を取得する
    ///
    /// レスポンスの`products`が複数件の場合は警告を出し、先頭の1件を返します。
    /// `products`が存在しない、または空の場合は`Error::UnexpectedResponse`。
    pub fn product_data(&self, product_id: &str) -> Result<Value, Error> {
        let body = self.get(&self.product_url, &[("tpnc", product_id.to_string())])?;

        let products = match body {
            Value::Object(mut map) => match map.remove("products") {
                Some(Value::Array(products)) => products,
                _ => {
                    return Err(Error::UnexpectedResponse(format!(
                        "No 'products' list in response for item {}",
                        product_id
                    )))
                }
            },
            _ => {
                return Err(Error::UnexpectedResponse(format!(
                    "Response for item {} is not a JSON object",
                    product_id
                )))
            }
        };

        if products.len() > 1 {
            tracing::warn!(
                product_id,
                count = products.len(),
                "More than one product returned for item {}",
                product_id
            );
        }

        products.into_iter().next().ok_or_else(|| {
            Error::UnexpectedResponse(format!("No product returned for item {}", product_id))
        })
    }

    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Value, Error> {
        tracing::debug!(url, ?query, "GET");
        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(query)
            .send()?;

        let status = response.status();
        if self.status_policy == StatusPolicy::Raise && !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        Ok(response.json::<Value>()?)
    }
}

/// 商品詳細の`calcNutrition.calcNutrients`をテーブルに変換する
///
/// 列は各要素のキーの和集合（出現順）です。
pub fn extract_nutrition(product: &Value) -> Result<Table, Error> {
    let nutrients = product
        .get("calcNutrition")
        .and_then(|n| n.get("calcNutrients"))
        .and_then(Value::as_array)
        .ok_or_else(|| {
            Error::UnexpectedResponse("No 'calcNutrition.calcNutrients' list in product".to_string())
        })?;

    let mut columns: Vec<String> = Vec::new();
    for nutrient in nutrients {
        let object = nutrient.as_object().ok_or_else(|| {
            Error::UnexpectedResponse("Nutrient entry is not a JSON object".to_string())
        })?;
        for key in object.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let mut table = Table::new(columns.clone());
    for nutrient in nutrients {
        let row = columns
            .iter()
            .map(|key| nutrient.get(key).map(json_to_cell).unwrap_or(CellValue::Empty))
            .collect();
        table.push_row(row);
    }
    Ok(table)
}

fn json_to_cell(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::Bool(b) => CellValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => CellValue::Int(i),
            None => CellValue::Number(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => CellValue::String(s.clone()),
        other => CellValue::String(other.to_string()),
    }
}
