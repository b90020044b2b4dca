pub mod client;
pub mod employee;
pub mod product;
pub mod sale;

pub use client::{Client, CreateClient, UpdateClient};
pub use employee::{CreateEmployee, Employee, EmployeeRole, PinLogin, UpdateEmployee};
pub use product::{
    classify, CreateProduct, CreateVariant, Product, ProductFilters, ProductRow, StockLevel,
    Variant,
};
pub use sale::{
    settle_payment, CreateSale, CreateSaleItem, PaymentMethod, Sale, SaleLineItem, SaleRow,
    SaleStatus,
};
