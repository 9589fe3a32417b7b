diesel::table! {
    business_settings (key) {
        key -> Varchar,
        value -> Text,
        updated_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    users (id) {
        id -> Uuid,
        email -> Varchar,
        wallet_balance -> Numeric,
        loyalty_point -> Int8,
        created_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    wallet_transactions (id) {
        id -> Int8,
        user_id -> Uuid,
        transaction_id -> Uuid,
        transaction_type -> Varchar,
        credit -> Numeric,
        debit -> Numeric,
        balance -> Numeric,
        reference -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    loyalty_transactions (id) {
        id -> Int8,
        user_id -> Uuid,
        transaction_id -> Uuid,
        transaction_type -> Varchar,
        credit -> Int8,
        debit -> Int8,
        balance -> Int8,
        reference -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    coupons (id) {
        id -> Uuid,
        code -> Varchar,
        coupon_type -> Varchar,
        discount_type -> Varchar,
        discount -> Numeric,
        max_discount -> Numeric,
        min_purchase -> Numeric,
        usage_limit -> Int8,
        customer_id -> Nullable<Uuid>,
        status -> Bool,
        created_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    products (id) {
        id -> Uuid,
        name -> Varchar,
        price -> Numeric,
        tax -> Numeric,
        discount -> Numeric,
        unit -> Nullable<Varchar>,
        added_by -> Varchar,
        seller_id -> Nullable<Uuid>,
        status -> Bool,
    }
}

diesel::table! {
    orders (id) {
        id -> Int8,
        user_id -> Uuid,
        order_amount -> Numeric,
        payment_status -> Varchar,
        order_status -> Varchar,
        payment_method -> Varchar,
        discount_amount -> Numeric,
        coupon_code -> Nullable<Varchar>,
        discount_type -> Nullable<Varchar>,
        shipping_address -> Nullable<Uuid>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    order_details (id) {
        id -> Uuid,
        order_id -> Int8,
        product_id -> Uuid,
        seller_id -> Nullable<Uuid>,
        product_details -> Jsonb,
        qty -> Int4,
        price -> Numeric,
        tax -> Numeric,
        discount -> Numeric,
        discount_type -> Varchar,
        variant -> Nullable<Varchar>,
        variation -> Jsonb,
        delivery_status -> Varchar,
        payment_status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(wallet_transactions -> users (user_id));
diesel::joinable!(loyalty_transactions -> users (user_id));
diesel::joinable!(orders -> users (user_id));
diesel::joinable!(order_details -> orders (order_id));

diesel::allow_tables_to_appear_in_same_query!(
    business_settings,
    users,
    wallet_transactions,
    loyalty_transactions,
    coupons,
    products,
    orders,
    order_details,
);
