use strum::{Display, EnumString};

/// Language used for operator-facing messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Locale {
    #[default]
    En,
    Ko,
}

impl Locale {
    /// Generic message shown for any network or HTTP failure.
    pub fn request_failed(self) -> &'static str {
        match self {
            Locale::En => "Error fetching data. Please try again.",
            Locale::Ko => "데이터를 가져오는 중 오류가 발생했습니다. 다시 시도해 주세요.",
        }
    }

    pub fn request_in_flight(self) -> &'static str {
        match self {
            Locale::En => "A query is already running; wait for it to finish.",
            Locale::Ko => "이미 조회가 진행 중입니다. 완료될 때까지 기다려 주세요.",
        }
    }

    pub fn loading(self) -> &'static str {
        match self {
            Locale::En => "Loading...",
            Locale::Ko => "불러오는 중...",
        }
    }
}
