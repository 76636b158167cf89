//! Row types for the hosted relational store

pub mod schemas;
