// src/models/mod.rs
pub mod aluno;
pub mod moderador;
pub mod pre_registration;
pub mod stats;
pub mod turma;
pub mod user;
pub mod validation;
