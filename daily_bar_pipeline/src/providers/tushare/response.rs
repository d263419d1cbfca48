use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use snafu::OptionExt;
use tracing::warn;

use crate::{
    models::bar::Bar,
    providers::{ApiSnafu, InternalSnafu, ProviderError},
};

/// Envelope of every Tushare Pro answer.
#[derive(Deserialize, Debug)]
pub struct TushareResponse {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<TushareTable>,
}

/// Column-oriented result table.
#[derive(Deserialize, Debug, Default)]
pub struct TushareTable {
    pub fields: Vec<String>,
    pub items: Vec<Vec<Value>>,
    #[serde(default)]
    pub has_more: bool,
}

impl TushareResponse {
    /// Unwraps the table, turning a non-zero `code` into an API error that
    /// carries the vendor message verbatim.
    pub fn into_table(self) -> Result<TushareTable, ProviderError> {
        if self.code != 0 {
            let msg = self.msg.unwrap_or_default();
            return ApiSnafu {
                message: format!("code {}: {}", self.code, msg),
            }
            .fail();
        }
        Ok(self.data.unwrap_or_default())
    }
}

impl TushareTable {
    fn column(&self, name: &str) -> Result<usize, ProviderError> {
        self.fields
            .iter()
            .position(|f| f == name)
            .context(InternalSnafu {
                message: format!("response is missing the `{name}` column"),
            })
    }

    fn optional_column(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    /// All non-null string values of one column, in row order.
    pub fn strings(&self, name: &str) -> Result<Vec<String>, ProviderError> {
        let idx = self.column(name)?;
        Ok(self
            .items
            .iter()
            .filter_map(|row| row.get(idx).and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    /// Decodes a `daily` / `index_daily` table into bars.
    ///
    /// Rows with a missing or non-finite price are skipped with a warning; a
    /// null volume reads as zero.
    pub fn to_bars(&self) -> Result<Vec<Bar>, ProviderError> {
        let code = self.column("ts_code")?;
        let date = self.column("trade_date")?;
        let open = self.column("open")?;
        let high = self.column("high")?;
        let low = self.column("low")?;
        let close = self.column("close")?;
        let pre_close = self.optional_column("pre_close");
        let change = self.optional_column("change");
        let pct_chg = self.optional_column("pct_chg");
        let vol = self.optional_column("vol");
        let amount = self.optional_column("amount");

        let number = |row: &[Value], idx: Option<usize>| -> Option<f64> {
            idx.and_then(|i| row.get(i)).and_then(Value::as_f64)
        };

        let mut bars = Vec::with_capacity(self.items.len());
        for row in &self.items {
            let symbol = row
                .get(code)
                .and_then(Value::as_str)
                .context(InternalSnafu {
                    message: "row without ts_code",
                })?;
            let raw_date = row.get(date).and_then(Value::as_str).unwrap_or_default();
            let day = NaiveDate::parse_from_str(raw_date, "%Y%m%d").map_err(|e| {
                InternalSnafu {
                    message: format!("bad trade_date {raw_date:?} for {symbol}: {e}"),
                }
                .build()
            })?;

            let (Some(o), Some(h), Some(l), Some(c)) = (
                number(row, Some(open)),
                number(row, Some(high)),
                number(row, Some(low)),
                number(row, Some(close)),
            ) else {
                warn!(symbol, date = %day, "skipping row with missing prices");
                continue;
            };

            let bar = Bar {
                symbol: symbol.to_string(),
                date: day,
                open: o,
                high: h,
                low: l,
                close: c,
                pre_close: number(row, pre_close),
                change: number(row, change),
                pct_change: number(row, pct_chg),
                volume: number(row, vol).unwrap_or(0.0),
                amount: number(row, amount),
            };
            if !bar.is_well_formed() {
                warn!(symbol, date = %day, "skipping malformed row");
                continue;
            }
            bars.push(bar);
        }
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAILY: &str = r#"{
        "request_id": "abc",
        "code": 0,
        "msg": "",
        "data": {
            "fields": ["ts_code","trade_date","open","high","low","close","pre_close","change","pct_chg","vol","amount"],
            "items": [
                ["600519.SH","20250103",1520.0,1530.5,1510.0,1525.12,1518.0,7.12,0.469,23456.78,3567890.1],
                ["601318.SH","20250103",50.1,51.0,49.8,50.5,50.0,0.5,1.0,null,null],
                ["600036.SH","20250103",null,36.0,35.0,35.5,35.2,0.3,0.85,1000.0,2000.0]
            ],
            "has_more": false
        }
    }"#;

    #[test]
    fn decodes_daily_table() {
        let resp: TushareResponse = serde_json::from_str(DAILY).unwrap();
        let table = resp.into_table().unwrap();
        let bars = table.to_bars().unwrap();

        // the third row has no open price and is dropped
        assert_eq!(bars.len(), 2);
        let moutai = &bars[0];
        assert_eq!(moutai.symbol, "600519.SH");
        assert_eq!(moutai.date, NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
        assert_eq!(moutai.close, 1525.12);
        assert_eq!(moutai.pct_change, Some(0.469));
        assert_eq!(moutai.volume, 23456.78);

        let pingan = &bars[1];
        assert_eq!(pingan.volume, 0.0);
        assert_eq!(pingan.amount, None);
    }

    #[test]
    fn non_zero_code_is_an_api_error() {
        let body = r#"{"code": 40203, "msg": "抱歉，您每分钟最多访问该接口500次", "data": null}"#;
        let resp: TushareResponse = serde_json::from_str(body).unwrap();
        let err = resp.into_table().unwrap_err();
        assert!(matches!(err, ProviderError::Api { .. }));
        assert!(err.to_string().contains("每分钟最多访问该接口500次"));
    }

    #[test]
    fn missing_required_column() {
        let table = TushareTable {
            fields: vec!["ts_code".into(), "trade_date".into()],
            items: vec![],
            has_more: false,
        };
        let err = table.to_bars().unwrap_err();
        assert!(err.to_string().contains("`open`"));
    }

    #[test]
    fn reads_constituent_codes() {
        let table = TushareTable {
            fields: vec!["index_code".into(), "con_code".into(), "weight".into()],
            items: vec![
                vec!["000016.SH".into(), "600519.SH".into(), 14.1.into()],
                vec!["000016.SH".into(), "601318.SH".into(), 7.2.into()],
            ],
            has_more: false,
        };
        assert_eq!(table.strings("con_code").unwrap(), vec!["600519.SH", "601318.SH"]);
    }
}
