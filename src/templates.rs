// src/templates.rs
use crate::models::stats::AdminStats;
use askama::Template;

// Struct para o template `login.html`
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    // Mensagem de erro opcional (login falhado)
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub admin: String,
    pub stats: AdminStats,
    // Já formatada com uma casa decimal
    pub taxa_ocupacao: String,
    pub pre_registrations_total: usize,
    pub pre_registrations_pagas: usize,
}

impl DashboardPage {
    pub fn new(admin: String, stats: AdminStats, pre_registrations_total: usize, pre_registrations_pagas: usize) -> Self {
        Self {
            admin,
            taxa_ocupacao: format!("{:.1}", stats.taxa_ocupacao),
            stats,
            pre_registrations_total,
            pre_registrations_pagas,
        }
    }
}
