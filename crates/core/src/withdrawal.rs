//! # Withdrawal Module
//!
//! State machine cho lệnh rút tiền: mỗi Withdrawal đi qua một chuỗi stage
//! cố định (`stage1`, `stage2`, ...) theo đúng thứ tự cho tới khi hoàn tất.
//!
//! Danh mục stage có 10 tên; số stage thực tế của mỗi lệnh rút được truyền
//! vào lúc khởi tạo (mặc định 5) và luôn là một prefix liên tục của danh mục.

use crate::account::Account;
use crate::error::{CoreError, CoreResult};
use crate::id::new_id;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Số tên stage trong danh mục (`stage1` .. `stage10`)
pub const STAGE_CATALOG_LEN: usize = 10;

/// Số stage mặc định cho một lệnh rút mới
pub const DEFAULT_STAGE_COUNT: usize = 5;

/// Tên stage, 1-based: `StageName::new(1)` là `stage1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StageName(u8);

impl StageName {
    /// Trả về None nếu index nằm ngoài danh mục
    pub fn new(index: u8) -> Option<Self> {
        if index >= 1 && usize::from(index) <= STAGE_CATALOG_LEN {
            Some(Self(index))
        } else {
            None
        }
    }

    pub fn index(&self) -> u8 {
        self.0
    }

    /// Stage kế tiếp trong danh mục (không xét số stage của lệnh rút)
    pub fn next(&self) -> Option<Self> {
        Self::new(self.0 + 1)
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage{}", self.0)
    }
}

impl FromStr for StageName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("stage")
            .and_then(|n| n.parse::<u8>().ok())
            .and_then(Self::new)
            .ok_or_else(|| CoreError::UnknownStage(s.to_string()))
    }
}

impl Serialize for StageName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StageName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Một checkpoint trong chuỗi hoàn tất của lệnh rút.
///
/// `completed` chỉ đi từ false -> true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub name: StageName,
    pub completed: bool,
}

/// Trạng thái của Withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Completed,
    /// Chỉ đặt được bởi operator, không có luồng tự động nào dẫn tới đây
    Failed,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Completed => "completed",
            WithdrawalStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(WithdrawalStatus::Pending),
            "completed" => Some(WithdrawalStatus::Completed),
            "failed" => Some(WithdrawalStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kết quả của một lần `advance`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Stage hiện tại đã xong, con trỏ chuyển sang stage này
    MovedTo(StageName),
    /// Stage cuối đã xong, withdrawal chuyển sang `completed`
    Completed,
}

/// Lệnh rút tiền gắn với một Account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    pub account_number: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: WithdrawalStatus,
    pub stages: Vec<Stage>,
    pub current_stage: StageName,
    pub description: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub version: i64,
}

/// Sinh danh sách stage `stage1..stageN`, tất cả chưa hoàn tất
pub fn stage_plan(stage_count: usize) -> CoreResult<Vec<Stage>> {
    if stage_count == 0 || stage_count > STAGE_CATALOG_LEN {
        return Err(CoreError::InvalidStageCount {
            requested: stage_count,
            max: STAGE_CATALOG_LEN,
        });
    }

    Ok((1..=stage_count as u8)
        .filter_map(StageName::new)
        .map(|name| Stage {
            name,
            completed: false,
        })
        .collect())
}

impl Withdrawal {
    /// Khởi tạo lệnh rút: stage1 được đánh dấu hoàn tất ngay, con trỏ vẫn ở
    /// `stage1`, status `pending`.
    ///
    /// Không kiểm tra số dư - việc trừ tiền do ledger thực hiện trước đó.
    pub fn initiate(
        account: &Account,
        amount: Decimal,
        currency: &str,
        description: &str,
        stage_count: usize,
    ) -> CoreResult<Self> {
        let mut withdrawal = Self::fresh(account, amount, currency, description, stage_count)?;
        withdrawal.stages[0].completed = true;
        Ok(withdrawal)
    }

    fn fresh(
        account: &Account,
        amount: Decimal,
        currency: &str,
        description: &str,
        stage_count: usize,
    ) -> CoreResult<Self> {
        let stages = stage_plan(stage_count)?;
        let current_stage = stages[0].name;

        Ok(Self {
            id: new_id(),
            user_id: account.user_id.clone(),
            account_id: account.id.clone(),
            account_number: account.account_number.clone(),
            amount,
            currency: currency.to_string(),
            status: WithdrawalStatus::Pending,
            stages,
            current_stage,
            description: description.to_string(),
            created_at: Utc::now(),
            version: 0,
        })
    }

    fn current_index(&self) -> Option<usize> {
        self.stages.iter().position(|s| s.name == self.current_stage)
    }

    /// Hoàn tất stage hiện tại và dịch con trỏ sang stage kế tiếp.
    ///
    /// Bị từ chối (không thay đổi gì) nếu stage hiện tại đã hoàn tất hoặc
    /// withdrawal không còn `pending`.
    pub fn advance(&mut self) -> CoreResult<Advance> {
        if self.status != WithdrawalStatus::Pending {
            return Err(CoreError::WithdrawalClosed(self.status.as_str().to_string()));
        }

        let index = self
            .current_index()
            .ok_or(CoreError::StageMissing(self.current_stage))?;

        if self.stages[index].completed {
            return Err(CoreError::StageAlreadyCompleted(self.current_stage));
        }

        self.stages[index].completed = true;

        match self.stages.get(index + 1) {
            Some(next) => {
                self.current_stage = next.name;
                Ok(Advance::MovedTo(next.name))
            }
            None => {
                self.status = WithdrawalStatus::Completed;
                Ok(Advance::Completed)
            }
        }
    }

    /// Số stage đã hoàn tất
    pub fn completed_stages(&self) -> usize {
        self.stages.iter().filter(|s| s.completed).count()
    }

    /// Kiểm tra invariant: con trỏ trỏ vào một stage có trong danh sách,
    /// mọi stage trước nó đều đã hoàn tất, và các stage được hoàn tất theo
    /// đúng thứ tự (không có stage xong nằm sau stage chưa xong).
    pub fn is_consistent(&self) -> bool {
        let Some(index) = self.current_index() else {
            return false;
        };

        let predecessors_done = self.stages[..index].iter().all(|s| s.completed);
        let in_order = self
            .stages
            .windows(2)
            .all(|pair| pair[0].completed || !pair[1].completed);

        predecessors_done && in_order
    }
}
