use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// 上市公司基本資料
pub mod company;
/// 上市個股日本益比、殖利率及股價淨值比
pub mod fundamentals;
/// 個股日成交資訊 (月)
pub mod stock_day;

const HOST: &str = "twse.com.tw";

/// 證交所 exchangeReport 系列回應的共同格式
#[derive(Serialize, Deserialize, Debug, Default)]
pub(crate) struct TableResponse {
    pub stat: Option<String>,
    pub fields: Option<Vec<String>>,
    pub data: Option<Vec<Vec<String>>>,
}

impl TableResponse {
    /// `stat` 為 "OK" 才有資料
    pub fn is_ok(&self) -> bool {
        self.stat
            .as_deref()
            .map(|stat| stat.eq_ignore_ascii_case("OK"))
            .unwrap_or(false)
    }

    pub fn field_index(&self) -> FieldIndex {
        FieldIndex::new(self.fields.as_deref().unwrap_or_default())
    }

    pub fn rows(&self) -> &[Vec<String>] {
        self.data.as_deref().unwrap_or_default()
    }
}

/// 欄位名稱對應到欄位位置，資料列以欄位名稱取值，
/// 證交所增減或調整欄位順序時不會取錯資料。
#[derive(Debug, Default)]
pub(crate) struct FieldIndex(HashMap<String, usize>);

impl FieldIndex {
    pub fn new(fields: &[String]) -> Self {
        FieldIndex(
            fields
                .iter()
                .enumerate()
                .map(|(i, name)| (name.trim().to_string(), i))
                .collect(),
        )
    }

    /// 取得欄位值，欄位不存在或資料列長度不足時回傳 `None`
    pub fn get<'a>(&self, row: &'a [String], field: &str) -> Option<&'a str> {
        self.0
            .get(field)
            .and_then(|&i| row.get(i))
            .map(|v| v.trim())
    }
}
